//! Database configuration
//!
//! Read from `/.eduhub/config.yaml`; every key is optional.
//!
//! ```yaml
//! auto_commit: true
//! author_name: EduHub
//! author_email: eduhub@local
//! archive_collection: archived_enrollments
//! views_dir: views
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Commit to git after every mutating operation
    pub auto_commit: bool,
    /// Commit author when git config has none
    pub author_name: String,
    pub author_email: String,
    /// Collection receiving archived enrollments
    pub archive_collection: String,
    /// Output directory for rendered views, relative to the root
    pub views_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_commit: true,
            author_name: "EduHub".to_string(),
            author_email: "eduhub@local".to_string(),
            archive_collection: "archived_enrollments".to_string(),
            views_dir: "views".to_string(),
        }
    }
}

impl Config {
    pub fn path(root: &Path) -> PathBuf {
        root.join(".eduhub").join("config.yaml")
    }

    /// Load the config for a database root, falling back to defaults
    pub fn load(root: &Path) -> crate::Result<Self> {
        let path = Self::path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|source| crate::Error::FileReadError {
            path: path.clone(),
            source,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        crate::validation::validate_collection_name(&config.archive_collection)?;
        Ok(config)
    }

    pub fn save(&self, root: &Path) -> crate::Result<()> {
        let path = Self::path(root);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self).map_err(|e| crate::Error::YamlSerializeError {
            message: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
