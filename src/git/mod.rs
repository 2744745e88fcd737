//! Git backend for EduHub
//!
//! Every mutating repository call ends in one commit, so the history of the
//! database directory doubles as an audit log of writes. Multi-document
//! operations (lesson reordering, archiving) are grouped into a single
//! [`Transaction`] commit.

use git2::{Repository as Git2Repo, Signature};
use std::path::Path;

use crate::config::Config;
use crate::error::Result;

/// Git repository wrapper for EduHub
pub struct Repository {
    inner: Git2Repo,
    author_name: String,
    author_email: String,
}

impl Repository {
    /// Open an existing repository or initialize a new one
    pub fn open_or_init(path: &Path, config: &Config) -> Result<Self> {
        let inner = match Git2Repo::open(path) {
            Ok(repo) => repo,
            Err(_) => {
                let repo = Git2Repo::init(path)?;
                Self::create_initial_commit(&repo, config)?;
                tracing::info!("Initialized git repository at {:?}", path);
                repo
            }
        };

        Ok(Self {
            inner,
            author_name: config.author_name.clone(),
            author_email: config.author_email.clone(),
        })
    }

    fn create_initial_commit(repo: &Git2Repo, config: &Config) -> Result<()> {
        let sig = Signature::now(&config.author_name, &config.author_email)?;
        let tree_id = repo.index()?.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        repo.commit(Some("HEAD"), &sig, &sig, "Initialize EduHub database", &tree, &[])?;

        Ok(())
    }

    /// Commit current changes with a message.
    ///
    /// Returns `None` when the working tree is clean.
    pub fn commit(&self, message: &str) -> Result<Option<git2::Oid>> {
        if !self.has_changes()? {
            return Ok(None);
        }

        let sig = self.signature()?;
        let mut index = self.inner.index()?;

        // Stage additions, modifications and deletions alike
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;

        let parent = self.inner.head()?.peel_to_commit()?;

        let oid = self
            .inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])?;

        tracing::debug!("Committed {}: {}", oid, message.lines().next().unwrap_or(""));
        Ok(Some(oid))
    }

    /// Get the current HEAD commit hash
    pub fn head_hash(&self) -> Result<String> {
        let commit = self.inner.head()?.peel_to_commit()?;
        Ok(commit.id().to_string())
    }

    /// Message of the HEAD commit
    pub fn head_message(&self) -> Result<String> {
        let commit = self.inner.head()?.peel_to_commit()?;
        Ok(commit.message().unwrap_or_default().to_string())
    }

    /// Number of commits reachable from HEAD
    pub fn commit_count(&self) -> Result<usize> {
        let mut walk = self.inner.revwalk()?;
        walk.push_head()?;
        Ok(walk.count())
    }

    /// Check if there are uncommitted changes
    pub fn has_changes(&self) -> Result<bool> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);
        let statuses = self.inner.statuses(Some(&mut opts))?;
        Ok(!statuses.is_empty())
    }

    fn signature(&self) -> Result<Signature<'static>> {
        // Prefer the user's git identity
        self.inner
            .signature()
            .or_else(|_| Signature::now(&self.author_name, &self.author_email))
            .map_err(Into::into)
    }
}

/// A group of writes committed together
pub struct Transaction<'a> {
    repo: &'a Repository,
    message: String,
    operations: Vec<String>,
}

impl<'a> Transaction<'a> {
    /// Start a new transaction
    pub fn begin(repo: &'a Repository, message: impl Into<String>) -> Self {
        Self {
            repo,
            message: message.into(),
            operations: Vec::new(),
        }
    }

    /// Record an operation in this transaction
    pub fn record(&mut self, operation: impl Into<String>) {
        self.operations.push(operation.into());
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Commit the transaction
    pub fn commit(self) -> Result<Option<git2::Oid>> {
        let full_message = if self.operations.is_empty() {
            self.message
        } else {
            format!("{}\n\n{}", self.message, self.operations.join("\n"))
        };

        self.repo.commit(&full_message)
    }
}
