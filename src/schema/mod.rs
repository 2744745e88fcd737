//! Schema definitions and validation for EduHub
//!
//! Schemas define the structure of collections:
//! - Field definitions with types
//! - Required vs optional fields, nullability
//! - Enum, pattern, length and range constraints
//! - Unique fields
//!
//! Schemas are stored in `/.eduhub/schemas/{collection}.yaml`. The built-in
//! entity schemas live in [`catalog`].

pub mod catalog;

use crate::storage::document::{Document, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A field type in the schema
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Int,
    /// Floating point; integers are accepted too
    Float,
    Bool,
    DateTime,
    Array(Box<FieldType>),
    Object,
    /// Reference to another document: the referenced id as a string
    Ref(String),
    /// GeoJSON point `{type: Point, coordinates: [lon, lat]}`
    GeoPoint,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Int => write!(f, "int"),
            FieldType::Float => write!(f, "float"),
            FieldType::Bool => write!(f, "bool"),
            FieldType::DateTime => write!(f, "datetime"),
            FieldType::Array(inner) => write!(f, "array<{}>", inner),
            FieldType::Object => write!(f, "object"),
            FieldType::Ref(target) => write!(f, "ref:{}", target),
            FieldType::GeoPoint => write!(f, "geopoint"),
        }
    }
}

/// Definition of a single field
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FieldDef {
    /// Field type
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Whether the field is required
    #[serde(default)]
    pub required: bool,
    /// Whether an explicit null is accepted
    #[serde(default)]
    pub nullable: bool,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Minimum string length, in characters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// Regex the string value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Allowed string values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    /// Unique constraint across the collection
    #[serde(default)]
    pub unique: bool,
    /// Nested field definitions for objects
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, FieldDef>,
}

impl FieldDef {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            ..Default::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.enum_values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.properties.insert(name.into(), def);
        self
    }

    fn check(&self, path: &str, value: &Value) -> Result<(), ValidationError> {
        if value.is_null() {
            if self.nullable {
                return Ok(());
            }
            return Err(ValidationError::TypeMismatch {
                field: path.to_string(),
                expected: self.field_type.to_string(),
                actual: "null".to_string(),
            });
        }

        check_type(path, &self.field_type, value)?;

        if let Value::String(s) = value {
            if let Some(min) = self.min_length {
                if s.chars().count() < min {
                    return Err(ValidationError::TooShort {
                        field: path.to_string(),
                        min,
                    });
                }
            }
            if !self.enum_values.is_empty() && !self.enum_values.iter().any(|v| v == s) {
                return Err(ValidationError::NotInEnum {
                    field: path.to_string(),
                    value: s.clone(),
                    allowed: self.enum_values.join(", "),
                });
            }
            if let Some(ref pattern) = self.pattern {
                let re = regex::Regex::new(pattern).map_err(|e| ValidationError::BadPattern {
                    field: path.to_string(),
                    message: e.to_string(),
                })?;
                if !re.is_match(s) {
                    return Err(ValidationError::PatternMismatch {
                        field: path.to_string(),
                        pattern: pattern.clone(),
                    });
                }
            }
        }

        if let Some(n) = value.as_f64() {
            let below = self.minimum.map(|min| n < min).unwrap_or(false);
            let above = self.maximum.map(|max| n > max).unwrap_or(false);
            if !n.is_finite() || below || above {
                return Err(ValidationError::OutOfRange {
                    field: path.to_string(),
                    value: n,
                    minimum: self.minimum,
                    maximum: self.maximum,
                });
            }
        }

        if let Value::Object(obj) = value {
            for (name, def) in &self.properties {
                let nested = format!("{}.{}", path, name);
                match obj.get(name) {
                    Some(v) => def.check(&nested, v)?,
                    None if def.required => return Err(ValidationError::MissingRequired(nested)),
                    None => {}
                }
            }
        }

        Ok(())
    }
}

fn check_type(path: &str, expected: &FieldType, value: &Value) -> Result<(), ValidationError> {
    let ok = match (expected, value) {
        (FieldType::String, Value::String(_)) => true,
        (FieldType::Int, Value::Int(_)) => true,
        (FieldType::Float, Value::Float(_) | Value::Int(_)) => true,
        (FieldType::Bool, Value::Bool(_)) => true,
        (FieldType::DateTime, Value::DateTime(_)) => true,
        (FieldType::Object, Value::Object(_)) => true,
        (FieldType::Ref(_), Value::String(s)) => !s.is_empty(),
        (FieldType::GeoPoint, v) => crate::features::geo::GeoPoint::from_value(v).is_some(),
        (FieldType::Array(inner), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                check_type(&format!("{}[{}]", path, i), inner, item)?;
            }
            true
        }
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(ValidationError::TypeMismatch {
            field: path.to_string(),
            expected: expected.to_string(),
            actual: value.type_name().to_string(),
        })
    }
}

/// Schema for a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    /// Collection name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Field whose value is kept in the markdown body instead of frontmatter
    #[serde(default)]
    pub body_field: Option<String>,
    /// Field definitions
    #[serde(default)]
    pub fields: BTreeMap<String, FieldDef>,
}

impl Schema {
    /// Create a new schema for a collection
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            body_field: None,
            fields: BTreeMap::new(),
        }
    }

    /// Add a field definition
    pub fn field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Keep `field` in the document body
    pub fn with_body_field(mut self, field: impl Into<String>) -> Self {
        self.body_field = Some(field.into());
        self
    }

    /// Names of fields carrying a unique constraint
    pub fn unique_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, def)| def.unique)
            .map(|(name, _)| name.as_str())
    }

    /// Validate a document against this schema
    ///
    /// Undeclared fields are accepted.
    pub fn validate(&self, doc: &Document) -> Result<(), ValidationError> {
        for (field_name, field_def) in &self.fields {
            let body_value;
            let value = if self.body_field.as_deref() == Some(field_name.as_str()) {
                body_value = Value::String(doc.body.clone());
                Some(&body_value)
            } else {
                doc.fields.get(field_name)
            };

            match value {
                Some(v) => field_def.check(field_name, v)?,
                None if field_def.required => {
                    return Err(ValidationError::MissingRequired(field_name.clone()))
                }
                None => {}
            }
        }

        Ok(())
    }
}

/// Validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingRequired(String),
    #[error("Invalid type for field {field}: expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },
    #[error("Field {field} must be at least {min} characters long")]
    TooShort { field: String, min: usize },
    #[error("Field {field} does not match pattern {pattern}")]
    PatternMismatch { field: String, pattern: String },
    #[error("Field {field} has value '{value}', expected one of: {allowed}")]
    NotInEnum {
        field: String,
        value: String,
        allowed: String,
    },
    #[error("Field {field} value {value} is outside [{minimum:?}, {maximum:?}]")]
    OutOfRange {
        field: String,
        value: f64,
        minimum: Option<f64>,
        maximum: Option<f64>,
    },
    #[error("Field {field} has an invalid pattern: {message}")]
    BadPattern { field: String, message: String },
}

/// Registry of all schemas in the database
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Schema>,
    path: PathBuf,
}

impl SchemaRegistry {
    /// Load schemas from the database directory
    pub fn load(db_path: &Path) -> crate::Result<Self> {
        let schema_path = db_path.join(".eduhub").join("schemas");
        let mut registry = Self {
            schemas: BTreeMap::new(),
            path: schema_path.clone(),
        };

        if schema_path.exists() {
            for entry in std::fs::read_dir(&schema_path)? {
                let path = entry?.path();
                if path.extension().map(|e| e == "yaml").unwrap_or(false) {
                    let content = std::fs::read_to_string(&path)?;
                    let schema: Schema = serde_yaml::from_str(&content)?;
                    registry.schemas.insert(schema.name.clone(), schema);
                }
            }
        }

        Ok(registry)
    }

    /// Get a schema by collection name
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Register a schema, replacing any previous one for the collection
    pub fn register(&mut self, schema: Schema) -> crate::Result<()> {
        std::fs::create_dir_all(&self.path)?;
        let file_path = self.path.join(format!("{}.yaml", schema.name));
        let content = serde_yaml::to_string(&schema).map_err(|e| crate::Error::YamlSerializeError {
            message: e.to_string(),
        })?;
        std::fs::write(file_path, content)?;

        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// List all registered schemas
    pub fn list(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn lesson_schema() -> Schema {
        Schema::new("lessons")
            .with_body_field("content")
            .field("title", FieldDef::new(FieldType::String).required().min_length(5))
            .field("content", FieldDef::new(FieldType::String).required().min_length(20))
            .field("order", FieldDef::new(FieldType::Int).required().range(Some(1.0), None))
            .field("level", FieldDef::new(FieldType::String).one_of(&["beginner", "advanced"]))
    }

    fn valid_lesson() -> Document {
        let mut doc = Document::new("l-1").with_body("Twenty characters of lesson material.");
        doc.set("title", "Lesson 1: Basics");
        doc.set("order", 1i64);
        doc
    }

    #[test]
    fn test_schema_validation() {
        let schema = lesson_schema();
        assert!(schema.validate(&valid_lesson()).is_ok());

        let empty_doc = Document::new("l-2");
        assert!(matches!(
            schema.validate(&empty_doc),
            Err(ValidationError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_body_field_length() {
        let schema = lesson_schema();
        let mut doc = valid_lesson();
        doc.body = "too short".into();
        assert!(matches!(schema.validate(&doc), Err(ValidationError::TooShort { .. })));
    }

    #[test]
    fn test_type_enum_and_range() {
        let schema = lesson_schema();

        let mut doc = valid_lesson();
        doc.set("order", "first");
        assert!(matches!(schema.validate(&doc), Err(ValidationError::TypeMismatch { .. })));

        let mut doc = valid_lesson();
        doc.set("order", 0i64);
        assert!(matches!(schema.validate(&doc), Err(ValidationError::OutOfRange { .. })));

        let mut doc = valid_lesson();
        doc.set("level", "expert");
        assert!(matches!(schema.validate(&doc), Err(ValidationError::NotInEnum { .. })));
    }

    #[test]
    fn test_nullable_and_nested() {
        let schema = Schema::new("submissions")
            .field(
                "grade",
                FieldDef::new(FieldType::Float).nullable().range(Some(0.0), Some(100.0)),
            )
            .field(
                "profile",
                FieldDef::new(FieldType::Object)
                    .property("skills", FieldDef::new(FieldType::Array(Box::new(FieldType::String)))),
            );

        let mut doc = Document::new("s-1");
        doc.set("grade", Value::Null);
        assert!(schema.validate(&doc).is_ok());

        doc.set("grade", 101.0);
        assert!(schema.validate(&doc).is_err());

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            doc.set("grade", bad);
            assert!(matches!(schema.validate(&doc), Err(ValidationError::OutOfRange { .. })));
        }

        let mut profile = BTreeMap::new();
        profile.insert("skills".to_string(), Value::Array(vec![Value::Int(3)]));
        let mut doc = Document::new("s-2");
        doc.set("profile", Value::Object(profile));
        let err = schema.validate(&doc).unwrap_err();
        assert!(err.to_string().contains("profile.skills[0]"));
    }

    #[test]
    fn test_registry_persists() {
        let tmp = TempDir::new().unwrap();
        let mut registry = SchemaRegistry::load(tmp.path()).unwrap();
        registry.register(lesson_schema()).unwrap();

        let reloaded = SchemaRegistry::load(tmp.path()).unwrap();
        let schema = reloaded.get("lessons").unwrap();
        assert_eq!(schema.body_field.as_deref(), Some("content"));
        assert_eq!(schema.fields["title"].min_length, Some(5));
    }
}
