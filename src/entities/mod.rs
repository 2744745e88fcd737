//! Typed entities and their mapping onto documents
//!
//! Each entity type owns one collection. Conversion to a [`Document`] is
//! lossless: optional fields that are absent are simply not written, while
//! nullable fields (submission grade and feedback) are written as `null`.

pub mod assignment;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod submission;
pub mod user;

pub use assignment::Assignment;
pub use course::Course;
pub use enrollment::Enrollment;
pub use lesson::Lesson;
pub use submission::Submission;
pub use user::{Profile, User};

use crate::error::{Error, Result};
use crate::storage::document::{Document, Value};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A record type stored in its own collection
pub trait Entity: Sized {
    /// Collection holding this entity
    const COLLECTION: &'static str;

    fn id(&self) -> &str;

    fn to_document(&self) -> Document;

    fn from_document(doc: &Document) -> Result<Self>;
}

/// Fresh opaque identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(Error::InvalidArgument {
                        message: format!(
                            "'{}' is not a valid {}, expected one of: {}",
                            other,
                            stringify!($name).to_lowercase(),
                            [$($text),+].join(", ")
                        ),
                    }),
                }
            }
        }

        impl From<$name> for Value {
            fn from(v: $name) -> Self {
                Value::String(v.as_str().to_string())
            }
        }
    };
}

string_enum! {
    /// User role
    Role {
        Student => "student",
        Instructor => "instructor",
    }
}

string_enum! {
    /// Course difficulty
    Level {
        Beginner => "beginner",
        Intermediate => "intermediate",
        Advanced => "advanced",
    }
}

string_enum! {
    /// Enrollment lifecycle state; any state may follow any other
    EnrollmentStatus {
        Active => "active",
        Completed => "completed",
        Dropped => "dropped",
    }
}

/// Typed field access on a stored document
pub(crate) struct Fields<'a> {
    doc: &'a Document,
    collection: &'static str,
}

impl<'a> Fields<'a> {
    pub(crate) fn of(doc: &'a Document, collection: &'static str) -> Self {
        Self { doc, collection }
    }

    fn missing(&self, field: &str) -> Error {
        Error::MissingRequiredField {
            collection: self.collection.to_string(),
            field: field.to_string(),
        }
    }

    fn mismatch(&self, field: &str, expected: &str, actual: &Value) -> Error {
        Error::TypeMismatch {
            collection: self.collection.to_string(),
            field: field.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
        }
    }

    fn present(&self, field: &str) -> Option<&'a Value> {
        self.doc.get(field).filter(|v| !v.is_null())
    }

    pub(crate) fn string(&self, field: &str) -> Result<String> {
        self.opt_string(field)?.ok_or_else(|| self.missing(field))
    }

    pub(crate) fn opt_string(&self, field: &str) -> Result<Option<String>> {
        match self.present(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.mismatch(field, "string", other)),
        }
    }

    pub(crate) fn parsed<T: FromStr<Err = Error>>(&self, field: &str) -> Result<T> {
        self.string(field)?.parse()
    }

    pub(crate) fn opt_parsed<T: FromStr<Err = Error>>(&self, field: &str) -> Result<Option<T>> {
        self.opt_string(field)?.map(|s| s.parse()).transpose()
    }

    pub(crate) fn datetime(&self, field: &str) -> Result<DateTime<Utc>> {
        self.opt_datetime(field)?.ok_or_else(|| self.missing(field))
    }

    pub(crate) fn opt_datetime(&self, field: &str) -> Result<Option<DateTime<Utc>>> {
        match self.present(field) {
            None => Ok(None),
            Some(Value::DateTime(dt)) => Ok(Some(*dt)),
            Some(other) => Err(self.mismatch(field, "datetime", other)),
        }
    }

    pub(crate) fn int(&self, field: &str) -> Result<i64> {
        match self.present(field) {
            None => Err(self.missing(field)),
            Some(Value::Int(i)) => Ok(*i),
            Some(other) => Err(self.mismatch(field, "int", other)),
        }
    }

    pub(crate) fn opt_float(&self, field: &str) -> Result<Option<f64>> {
        match self.present(field) {
            None => Ok(None),
            Some(v) => v.as_f64().map(Some).ok_or_else(|| self.mismatch(field, "float", v)),
        }
    }

    pub(crate) fn bool_or(&self, field: &str, default: bool) -> Result<bool> {
        match self.present(field) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(self.mismatch(field, "bool", other)),
        }
    }

    pub(crate) fn strings(&self, field: &str) -> Result<Vec<String>> {
        strings_of(self.present(field)).ok_or_else(|| {
            let actual = self.present(field).cloned().unwrap_or(Value::Null);
            self.mismatch(field, "array<string>", &actual)
        })
    }

    pub(crate) fn value(&self, field: &str) -> Option<&'a Value> {
        self.present(field)
    }
}

/// String items of an optional array value; `None` if any item is not a string
pub(crate) fn strings_of(value: Option<&Value>) -> Option<Vec<String>> {
    match value {
        None => Some(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(_) => None,
    }
}

/// Append `extra` to `items`, skipping values already present
pub(crate) fn add_to_set(items: &mut Vec<String>, extra: impl IntoIterator<Item = String>) {
    for value in extra {
        if !items.contains(&value) {
            items.push(value);
        }
    }
}

/// Set `key` only when a value is present
pub(crate) fn set_opt(doc: &mut Document, key: &str, value: Option<impl Into<Value>>) {
    if let Some(v) = value {
        doc.set(key, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trip() {
        for status in EnrollmentStatus::ALL {
            assert_eq!(status.as_str().parse::<EnrollmentStatus>().unwrap(), *status);
        }
        assert_eq!(Level::Intermediate.to_string(), "intermediate");
        assert!("tutor".parse::<Role>().unwrap_err().is_validation());
    }

    #[test]
    fn test_add_to_set() {
        let mut tags = vec!["Online".to_string()];
        add_to_set(&mut tags, vec!["AI".to_string(), "Online".to_string(), "AI".to_string()]);
        assert_eq!(tags, vec!["Online", "AI"]);
    }

    #[test]
    fn test_field_reader_errors() {
        let mut doc = Document::new("x");
        doc.set("title", 5i64);
        let fields = Fields::of(&doc, "courses");
        assert!(matches!(fields.string("title"), Err(Error::TypeMismatch { .. })));
        assert!(matches!(fields.string("nope"), Err(Error::MissingRequiredField { .. })));
        assert_eq!(fields.opt_string("nope").unwrap(), None);
        assert!(fields.bool_or("is_active", true).unwrap());
    }
}
