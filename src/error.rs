//! Error types for EduHub
//!
//! Every failure is sorted into one of four categories: conflicts on unique
//! data, validation failures, missing entities, and storage/IO problems.
//! Repositories return these to the caller instead of retrying.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for EduHub operations
#[derive(Debug, Error)]
pub enum Error {
    // ==========================================================================
    // Document Errors
    // ==========================================================================
    #[error("Document '{id}' not found in collection '{collection}'")]
    NotFound { collection: String, id: String },

    #[error("Document '{id}' already exists in collection '{collection}'")]
    DocumentAlreadyExists { collection: String, id: String },

    #[error("Unique constraint violated in '{collection}': {field} '{value}' is already taken")]
    Conflict {
        collection: String,
        field: String,
        value: String,
    },

    // ==========================================================================
    // Schema Errors
    // ==========================================================================
    #[error("Schema validation failed for collection '{collection}': {message}")]
    Validation { collection: String, message: String },

    #[error("Missing required field '{field}' in collection '{collection}'")]
    MissingRequiredField { collection: String, field: String },

    #[error("Type mismatch for field '{field}' in '{collection}': expected {expected}, got {actual}")]
    TypeMismatch {
        collection: String,
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    // ==========================================================================
    // Identifier Errors
    // ==========================================================================
    #[error("Invalid {kind} '{value}': {reason}")]
    InvalidIdentifier {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Reserved name '{name}' cannot be used")]
    ReservedName { name: String },

    // ==========================================================================
    // Git Errors
    // ==========================================================================
    #[error("Git operation failed: {message}")]
    GitError {
        message: String,
        #[source]
        source: Option<git2::Error>,
    },

    // ==========================================================================
    // IO Errors
    // ==========================================================================
    #[error("Failed to read file '{path}': {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==========================================================================
    // Serialization Errors
    // ==========================================================================
    #[error("Failed to parse YAML: {message}")]
    YamlParseError { message: String },

    #[error("Failed to serialize to YAML: {message}")]
    YamlSerializeError { message: String },

    #[error("Failed to parse JSON: {message}")]
    JsonParseError { message: String },

    #[error("Template error: {message}")]
    TemplateError { message: String },

    // ==========================================================================
    // Catch-all
    // ==========================================================================
    #[error("{0}")]
    Other(String),
}

/// Result type alias for EduHub operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error taxonomy used by callers deciding how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Conflict,
    Validation,
    NotFound,
    Io,
}

// =============================================================================
// Conversions from external error types
// =============================================================================

impl From<git2::Error> for Error {
    fn from(err: git2::Error) -> Self {
        Error::GitError {
            message: err.message().to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::YamlParseError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonParseError {
            message: err.to_string(),
        }
    }
}

impl From<tera::Error> for Error {
    fn from(err: tera::Error) -> Self {
        Error::TemplateError {
            message: err.to_string(),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<crate::validation::ValidationError> for Error {
    fn from(err: crate::validation::ValidationError) -> Self {
        match err {
            crate::validation::ValidationError::InvalidIdentifier(value, reason) => {
                Error::InvalidIdentifier {
                    kind: "identifier",
                    value,
                    reason,
                }
            }
            crate::validation::ValidationError::TooLong(value, _max) => Error::InvalidIdentifier {
                kind: "identifier",
                value,
                reason: "exceeds maximum length",
            },
            crate::validation::ValidationError::Empty => Error::InvalidIdentifier {
                kind: "identifier",
                value: String::new(),
                reason: "cannot be empty",
            },
            crate::validation::ValidationError::Reserved(name) => Error::ReservedName { name },
        }
    }
}

impl crate::schema::ValidationError {
    /// Attach the collection name to a schema violation
    pub fn into_error(self, collection: &str) -> Error {
        let collection = collection.to_string();
        match self {
            crate::schema::ValidationError::MissingRequired(field) => {
                Error::MissingRequiredField { collection, field }
            }
            crate::schema::ValidationError::TypeMismatch {
                field,
                expected,
                actual,
            } => Error::TypeMismatch {
                collection,
                field,
                expected,
                actual,
            },
            other => Error::Validation {
                collection,
                message: other.to_string(),
            },
        }
    }
}

// =============================================================================
// Error Display Helpers
// =============================================================================

impl Error {
    /// Which of the four failure categories this error belongs to
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Conflict { .. } | Error::DocumentAlreadyExists { .. } => ErrorCategory::Conflict,
            Error::Validation { .. }
            | Error::MissingRequiredField { .. }
            | Error::TypeMismatch { .. }
            | Error::InvalidArgument { .. }
            | Error::InvalidIdentifier { .. }
            | Error::ReservedName { .. } => ErrorCategory::Validation,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            _ => ErrorCategory::Io,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.category() == ErrorCategory::Conflict
    }

    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    /// Returns a user-friendly suggestion for fixing the error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::NotFound { .. } => Some("Check the referenced id and that the record was not deleted"),
            Error::Conflict { .. } => Some("Use a different value for the unique field"),
            Error::InvalidIdentifier { .. } => {
                Some("Use only letters, numbers, underscores, and hyphens")
            }
            Error::MissingRequiredField { .. } => Some("Provide every required field"),
            _ => None,
        }
    }

    /// Returns true if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        self.category() != ErrorCategory::Io
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound {
            collection: "courses".to_string(),
            id: "c-1".to_string(),
        };
        assert_eq!(err.to_string(), "Document 'c-1' not found in collection 'courses'");
    }

    #[test]
    fn test_error_categories() {
        let conflict = Error::Conflict {
            collection: "users".into(),
            field: "email".into(),
            value: "a@b.io".into(),
        };
        assert!(conflict.is_conflict());
        assert!(conflict.suggestion().is_some());

        let missing = Error::NotFound {
            collection: "users".into(),
            id: "nope".into(),
        };
        assert!(missing.is_not_found());
        assert!(missing.is_recoverable());

        let io = Error::Other("disk gone".into());
        assert_eq!(io.category(), ErrorCategory::Io);
        assert!(!io.is_recoverable());
    }
}
