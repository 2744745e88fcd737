//! EduHub - an online-learning database over git-versioned markdown
//!
//! Entities live as markdown documents with YAML frontmatter, one collection
//! per entity type. Every write goes through the [`Database`] session, which
//! validates against the registered schemas, enforces unique fields, and
//! commits the change to git.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         EduHub                                  │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  Reports    │  │  Features   │  │   Views                 │  │
//! │  │  (13 stats) │  │ search/geo/ │  │   (Tera templates)      │  │
//! │  │             │  │ archive     │  │                         │  │
//! │  └──────┬──────┘  └──────┬──────┘  └───────────┬─────────────┘  │
//! │         ▼                ▼                     ▼                │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │   Repositories (users, courses, enrollments, lessons, ...)  ││
//! │  │   Query layer (filters, aggregation pipelines)              ││
//! │  └──────────────────────────┬──────────────────────────────────┘│
//! │                             ▼                                   │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │   Database session: schemas, unique checks, auto-commit     ││
//! │  └──────────────────────────┬──────────────────────────────────┘│
//! │                             ▼                                   │
//! │  ┌─────────────────────────────────────────────────────────────┐│
//! │  │   Storage (Collection / Document)  +  Git backend           ││
//! │  │   /collections/{name}/{id}.md                               ││
//! │  └─────────────────────────────────────────────────────────────┘│
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod entities;
pub mod error;
pub mod export;
pub mod features;
pub mod git;
pub mod query;
pub mod repo;
pub mod reports;
pub mod schema;
pub mod seed;
pub mod storage;
pub mod validation;
pub mod views;

pub use config::Config;
pub use error::{Error, Result};
pub use query::filter::Filter;
pub use schema::Schema;
pub use storage::collection::Collection;
pub use storage::document::{Document, Value};

use std::path::PathBuf;

/// The main database handle
pub struct Database {
    /// Root path of the database
    pub root: PathBuf,
    /// Git repository handle
    pub git: git::Repository,
    /// Loaded configuration
    pub config: Config,
    /// Schema registry
    pub(crate) schema: schema::SchemaRegistry,
}

impl Database {
    /// Open or create a database at the given path
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let root = path.into();
        tokio::fs::create_dir_all(&root).await?;
        let config = Config::load(&root)?;
        let git = git::Repository::open_or_init(&root, &config)?;
        let schema = schema::SchemaRegistry::load(&root)?;

        Ok(Self {
            root,
            git,
            config,
            schema,
        })
    }

    /// Handle to a collection by name
    pub fn collection(&self, name: &str) -> Result<Collection> {
        validation::validate_collection_name(name)?;
        Ok(Collection::open(name, &self.root))
    }

    /// The schema registered for a collection, if any
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schema.get(name)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schema.list()
    }

    /// Install the built-in validators.
    ///
    /// Destructive: every entity collection and the archive are dropped and
    /// recreated empty, so data must be seeded again afterwards.
    pub async fn apply_validators(&mut self) -> Result<()> {
        let archive = self.config.archive_collection.clone();
        let schemas = schema::catalog::all()
            .into_iter()
            .chain(std::iter::once(schema::catalog::archived_enrollments(&archive)));

        for schema in schemas {
            let collection = self.collection(&schema.name)?;
            collection.drop_all().await?;
            collection.ensure_exists().await?;
            tracing::info!("Applied validator to collection '{}'", schema.name);
            self.schema.register(schema)?;
        }

        self.commit("Apply collection validators")?;
        Ok(())
    }

    /// Fetch a document by id
    pub async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        self.collection(collection)?.get(id).await
    }

    /// Fetch a document that must exist
    pub async fn require(&self, collection: &str, id: &str) -> Result<Document> {
        self.get(collection, id).await?.ok_or_else(|| Error::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        })
    }

    pub async fn exists(&self, collection: &str, id: &str) -> Result<bool> {
        Ok(self.collection(collection)?.contains(id).await)
    }

    /// All documents of a collection matching `filter`, ordered by id
    pub async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        let docs = self.collection(collection)?.list().await?;
        Ok(docs.into_iter().filter(|d| filter.matches(d)).collect())
    }

    pub async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        Ok(self.find(collection, filter).await?.into_iter().next())
    }

    /// Run every check a write of `doc` would run, without writing
    pub async fn validate(&self, collection: &str, doc: &Document) -> Result<()> {
        validation::validate_document_id(&doc.id)?;
        self.check(collection, doc).await
    }

    /// Validate and insert a new document. Does not commit.
    pub async fn insert(&self, collection: &str, doc: &Document) -> Result<()> {
        self.validate(collection, doc).await?;
        self.collection(collection)?.insert(doc).await
    }

    /// Validate and overwrite an existing document. Does not commit.
    pub async fn update(&self, collection: &str, doc: &Document) -> Result<()> {
        self.validate(collection, doc).await?;
        self.collection(collection)?.update(doc).await
    }

    /// Validate and write a document whether or not it exists. Does not commit.
    pub async fn upsert(&self, collection: &str, doc: &Document) -> Result<()> {
        self.validate(collection, doc).await?;
        self.collection(collection)?.upsert(doc).await
    }

    /// Remove a document. Does not commit.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        self.collection(collection)?.delete(id).await
    }

    /// Commit pending changes when auto-commit is enabled
    pub fn commit(&self, message: &str) -> Result<()> {
        if self.config.auto_commit {
            self.git.commit(message)?;
        }
        Ok(())
    }

    /// Start a grouped commit for a multi-document write
    pub fn transaction(&self, message: impl Into<String>) -> git::Transaction<'_> {
        git::Transaction::begin(&self.git, message)
    }

    /// Finish a grouped commit, honouring auto-commit
    pub fn commit_transaction(&self, tx: git::Transaction<'_>) -> Result<()> {
        if self.config.auto_commit {
            tx.commit()?;
        }
        Ok(())
    }

    async fn check(&self, collection: &str, doc: &Document) -> Result<()> {
        let Some(schema) = self.schema.get(collection) else {
            return Ok(());
        };

        schema.validate(doc).map_err(|e| e.into_error(collection))?;

        let unique: Vec<&str> = schema.unique_fields().collect();
        if unique.is_empty() {
            return Ok(());
        }

        let existing = self.collection(collection)?.list().await?;
        for field in unique {
            let Some(value) = doc.get(field).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = existing
                .iter()
                .filter(|other| other.id != doc.id)
                .any(|other| other.get(field) == Some(value));
            if taken {
                return Err(Error::Conflict {
                    collection: collection.to_string(),
                    field: field.to_string(),
                    value: value.as_str().map(str::to_string).unwrap_or_else(|| format!("{:?}", value)),
                });
            }
        }

        Ok(())
    }
}
