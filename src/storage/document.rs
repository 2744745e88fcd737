//! Document representation
//!
//! A Document is a single markdown file with YAML frontmatter.
//! The frontmatter contains structured data (fields), and the body
//! contains the markdown content.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A document in the database
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Unique identifier (derived from filename, without .md extension)
    pub id: String,

    /// Path relative to collection root
    #[serde(skip)]
    pub path: PathBuf,

    /// YAML frontmatter fields
    pub fields: Fields,

    /// Markdown body content
    #[serde(skip_serializing_if = "String::is_empty")]
    pub body: String,
}

/// Field values that can be stored in frontmatter
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// UTC timestamp, serialized as RFC 3339
    DateTime(DateTime<Utc>),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of ints and floats alike
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the value's type, as used in validation messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Walk a dotted path (`profile.skills`) into nested objects
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut current = self;
        for segment in path.split('.') {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::Array(items.into_iter().map(Value::String).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A map of field names to values
pub type Fields = BTreeMap<String, Value>;

impl Document {
    /// Create a new document with the given ID
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            path: PathBuf::from(format!("{}.md", &id)),
            id,
            fields: Fields::new(),
            body: String::new(),
        }
    }

    /// Set a field value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Get a top-level field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Remove a field, returning its previous value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    /// Resolve a field path for queries.
    ///
    /// `_id` resolves to the document id and dotted paths descend into
    /// nested objects.
    pub fn get_field(&self, path: &str) -> Option<Value> {
        if path == "_id" {
            return Some(Value::String(self.id.clone()));
        }
        match path.split_once('.') {
            None => self.fields.get(path).cloned(),
            Some((head, rest)) => self.fields.get(head)?.get_path(rest).cloned(),
        }
    }

    /// Set the body content
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Parse a document from markdown content
    pub fn parse(id: impl Into<String>, content: &str) -> crate::Result<Self> {
        let id = id.into();
        let (fields, body) = super::frontmatter::parse(content)?;

        Ok(Self {
            path: PathBuf::from(format!("{}.md", &id)),
            id,
            fields,
            body,
        })
    }

    /// Render document back to markdown
    pub fn render(&self) -> crate::Result<String> {
        super::frontmatter::render(&self.fields, &self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_document_creation() {
        let mut doc = Document::new("my-doc");
        doc.set("title", "Hello World")
            .set("order", 1i64)
            .set("is_published", false);

        assert_eq!(doc.id, "my-doc");
        assert_eq!(doc.get("title"), Some(&Value::String("Hello World".into())));
    }

    #[test]
    fn test_get_field_paths() {
        let mut profile = BTreeMap::new();
        profile.insert("bio".to_string(), Value::from("Teaches Rust"));
        let mut doc = Document::new("u-1");
        doc.set("profile", Value::Object(profile));

        assert_eq!(doc.get_field("_id"), Some(Value::from("u-1")));
        assert_eq!(doc.get_field("profile.bio"), Some(Value::from("Teaches Rust")));
        assert_eq!(doc.get_field("profile.avatar"), None);
        assert_eq!(doc.get_field("missing.bio"), None);
    }

    #[test]
    fn test_roundtrip() {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let mut doc = Document::new("lesson-1");
        doc.set("title", "Ownership basics");
        doc.set("created_at", created);
        doc.set("grade", Value::Null);
        doc.body = "Borrowing rules.\n\nWith multiple paragraphs.".into();

        let rendered = doc.render().unwrap();
        let parsed = Document::parse("lesson-1", &rendered).unwrap();

        assert_eq!(parsed.fields, doc.fields);
        assert_eq!(parsed.body.trim(), doc.body.trim());
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(2.5).as_i64(), None);
        assert_eq!(Value::from(None::<String>), Value::Null);
    }
}
