//! Identifier validation for EduHub
//!
//! Collection names and document ids become directory and file names, so
//! they are checked before any path is built from them.

use thiserror::Error;

/// Validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid identifier '{0}': {1}")]
    InvalidIdentifier(String, &'static str),

    #[error("Identifier '{0}' is too long (max {1} characters)")]
    TooLong(String, usize),

    #[error("Identifier cannot be empty")]
    Empty,

    #[error("Reserved name: '{0}'")]
    Reserved(String),
}

/// Maximum length for identifiers
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Reserved names that cannot be used
const RESERVED_NAMES: &[&str] = &[
    ".", "..", "con", "prn", "aux", "nul",
    "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8", "com9",
    "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Validate a collection name
///
/// Rules:
/// - Must be 1-255 characters
/// - Only alphanumeric, underscore, and hyphen allowed
/// - Cannot start with a hyphen or underscore
/// - Cannot be a reserved name (case-insensitive)
pub fn validate_collection_name(name: &str) -> Result<(), ValidationError> {
    validate_identifier(name)
}

/// Validate a document ID
///
/// Same rules as collection names; generated UUIDs always pass.
pub fn validate_document_id(id: &str) -> Result<(), ValidationError> {
    validate_identifier(id)
}

fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Empty);
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong(name.to_string(), MAX_IDENTIFIER_LENGTH));
    }

    for (i, c) in name.chars().enumerate() {
        if !c.is_ascii_alphanumeric() && c != '_' && c != '-' {
            return Err(ValidationError::InvalidIdentifier(
                name.to_string(),
                "contains invalid characters (only alphanumeric, underscore, and hyphen allowed)",
            ));
        }
        if i == 0 && (c == '-' || c == '_') {
            return Err(ValidationError::InvalidIdentifier(
                name.to_string(),
                "cannot start with hyphen or underscore",
            ));
        }
    }

    if RESERVED_NAMES.contains(&name.to_lowercase().as_str()) {
        return Err(ValidationError::Reserved(name.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_collection_name("courses").is_ok());
        assert!(validate_collection_name("archived_enrollments").is_ok());
        assert!(validate_document_id("1b4e28ba-2fa1-11d2-883f-0016d3cca427").is_ok());
    }

    #[test]
    fn test_path_traversal_blocked() {
        assert!(validate_collection_name("..").is_err());
        assert!(validate_collection_name("../secret").is_err());
        assert!(validate_document_id("foo/bar").is_err());
        assert!(validate_document_id("foo\\bar").is_err());
    }

    #[test]
    fn test_invalid_start_and_reserved() {
        assert!(validate_collection_name("-users").is_err());
        assert!(validate_collection_name("_users").is_err());
        assert!(validate_collection_name("CON").is_err());
    }

    #[test]
    fn test_empty_and_too_long() {
        assert!(validate_document_id("").is_err());
        assert!(validate_document_id(&"a".repeat(256)).is_err());
    }
}
