//! Collection - a group of documents stored in a directory
//!
//! Each entity type maps to one collection, and each document is a markdown
//! file named after its id.
//!
//! Directory structure:
//! ```text
//! /collections/
//!   /courses/
//!     6f1c...e2.md
//!   /lessons/
//!     0b9a...41.md
//! ```

use super::document::Document;
use crate::error::{Error, Result};
use crate::validation::validate_document_id;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// A collection of documents
#[derive(Debug, Clone)]
pub struct Collection {
    /// Name of the collection (directory name)
    pub name: String,
    /// Path to the collection directory
    pub path: PathBuf,
}

impl Collection {
    /// Open a collection at the given path
    pub fn open(name: impl Into<String>, base_path: &Path) -> Self {
        let name = name.into();
        let path = base_path.join("collections").join(&name);
        Self { name, path }
    }

    /// Create the collection directory if it doesn't exist
    pub async fn ensure_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.path).await?;
        Ok(())
    }

    /// Check if the collection exists
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// Remove the collection and every document in it
    pub async fn drop_all(&self) -> Result<()> {
        if self.exists().await {
            fs::remove_dir_all(&self.path).await?;
        }
        Ok(())
    }

    /// List all documents in the collection, ordered by id
    pub async fn list(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        if !self.exists().await {
            return Ok(documents);
        }

        for entry in WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            let path = entry.path();
            if path.extension().map(|e| e == "md").unwrap_or(false) {
                match self.read_document(path).await {
                    Ok(doc) => documents.push(doc),
                    Err(e) => tracing::warn!("Skipping unreadable document {:?}: {}", path, e),
                }
            }
        }

        Ok(documents)
    }

    /// Read a single document by ID
    pub async fn get(&self, id: &str) -> Result<Option<Document>> {
        let Some(path) = self.existing_path(id) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        self.read_document(&path).await.map(Some)
    }

    /// Whether a document with this id is present
    pub async fn contains(&self, id: &str) -> bool {
        self.existing_path(id).is_some_and(|path| path.exists())
    }

    /// Insert a new document
    pub async fn insert(&self, doc: &Document) -> Result<()> {
        let path = self.document_path(&doc.id)?;
        self.ensure_exists().await?;

        if path.exists() {
            return Err(Error::DocumentAlreadyExists {
                collection: self.name.clone(),
                id: doc.id.clone(),
            });
        }

        self.write_document(&path, doc).await
    }

    /// Update an existing document
    pub async fn update(&self, doc: &Document) -> Result<()> {
        let Some(path) = self.existing_path(&doc.id).filter(|p| p.exists()) else {
            return Err(Error::NotFound {
                collection: self.name.clone(),
                id: doc.id.clone(),
            });
        };

        self.write_document(&path, doc).await
    }

    /// Upsert a document (insert or update)
    pub async fn upsert(&self, doc: &Document) -> Result<()> {
        let path = self.document_path(&doc.id)?;
        self.ensure_exists().await?;
        self.write_document(&path, doc).await
    }

    /// Delete a document by ID
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let Some(path) = self.existing_path(id) else {
            return Ok(false);
        };
        if path.exists() {
            fs::remove_file(&path).await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Count documents in the collection
    pub async fn count(&self) -> Result<usize> {
        let docs = self.list().await?;
        Ok(docs.len())
    }

    /// File of a document, for ids that can name one
    fn document_path(&self, id: &str) -> Result<PathBuf> {
        validate_document_id(id)?;
        Ok(self.path.join(format!("{}.md", id)))
    }

    /// Lookup path; an id that fails validation names no stored document
    fn existing_path(&self, id: &str) -> Option<PathBuf> {
        self.document_path(id).ok()
    }

    async fn write_document(&self, path: &Path, doc: &Document) -> Result<()> {
        let content = doc.render()?;
        fs::write(path, content)
            .await
            .map_err(|source| Error::FileWriteError {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Read a document from a path
    async fn read_document(&self, path: &Path) -> Result<Document> {
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::Other(format!("Invalid document path {:?}", path)))?;

        let content = fs::read_to_string(path)
            .await
            .map_err(|source| Error::FileReadError {
                path: path.to_path_buf(),
                source,
            })?;
        let mut doc = Document::parse(id, &content)?;

        // Set relative path within collection
        if let Ok(relative) = path.strip_prefix(&self.path) {
            doc.path = relative.to_path_buf();
        }

        Ok(doc)
    }
}
