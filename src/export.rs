//! JSON export and import of the whole database
//!
//! The dump is one object keyed by collection name, each holding an array of
//! documents:
//!
//! ```json
//! { "users": [ { "_id": "…", "email": "…", "created_at": "2024-03-01T09:00:00Z" } ] }
//! ```
//!
//! Date-times become RFC 3339 strings and a body field is written like any
//! other field. Import reverses this with the collection schemas as the type
//! source, so date-time fields come back as date-times rather than strings.

use crate::error::{Error, Result};
use crate::query::pipeline::document_row;
use crate::schema::catalog::ENTITY_COLLECTIONS;
use crate::schema::{FieldDef, FieldType, Schema};
use crate::storage::document::{Document, Value};
use crate::storage::frontmatter::{format_datetime, parse_datetime};
use crate::Database;
use serde_json::{Map, Number};
use std::collections::BTreeMap;
use std::path::Path;

const ID_KEY: &str = "_id";

/// Documents per collection touched by an export or import
pub type Counts = BTreeMap<String, usize>;

/// Every entity collection plus the archive, in dependency order
fn exported_collections(db: &Database) -> Vec<String> {
    ENTITY_COLLECTIONS
        .iter()
        .map(|c| c.to_string())
        .chain(std::iter::once(db.config.archive_collection.clone()))
        .collect()
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::DateTime(dt) => serde_json::Value::String(format_datetime(dt)),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
    }
}

/// Convert JSON back to a stored value, guided by the declared field type
fn json_to_value(json: &serde_json::Value, def: Option<&FieldDef>) -> Result<Value> {
    let field_type = def.map(|d| &d.field_type);
    Ok(match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => match field_type {
            Some(FieldType::DateTime) => Value::DateTime(parse_datetime(s)?),
            _ => Value::String(s.clone()),
        },
        serde_json::Value::Array(items) => {
            let item_def = match field_type {
                Some(FieldType::Array(inner)) => Some(FieldDef::new((**inner).clone())),
                _ => None,
            };
            Value::Array(
                items
                    .iter()
                    .map(|item| json_to_value(item, item_def.as_ref()))
                    .collect::<Result<_>>()?,
            )
        }
        serde_json::Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let property = def.and_then(|d| d.properties.get(k));
                    Ok((k.clone(), json_to_value(v, property)?))
                })
                .collect::<Result<_>>()?,
        ),
    })
}

fn document_to_json(doc: Document, schema: Option<&Schema>) -> serde_json::Value {
    let body_field = schema.and_then(|s| s.body_field.as_deref());
    let row = document_row(doc, body_field);
    serde_json::Value::Object(row.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect())
}

fn document_from_json(collection: &str, json: &serde_json::Value, schema: Option<&Schema>) -> Result<Document> {
    let object = json.as_object().ok_or_else(|| Error::JsonParseError {
        message: format!("{}: expected a document object, got {}", collection, json),
    })?;
    let id = object
        .get(ID_KEY)
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::JsonParseError {
            message: format!("{}: document without a string '{}'", collection, ID_KEY),
        })?;

    let body_field = schema.and_then(|s| s.body_field.as_deref());
    let mut doc = Document::new(id);
    for (key, raw) in object {
        if key == ID_KEY {
            continue;
        }
        if Some(key.as_str()) == body_field {
            doc.body = raw.as_str().unwrap_or_default().to_string();
            continue;
        }
        let def = schema.and_then(|s| s.fields.get(key));
        doc.set(key.as_str(), json_to_value(raw, def)?);
    }
    Ok(doc)
}

/// Dump every collection into one JSON object
pub async fn export_json(db: &Database) -> Result<(serde_json::Value, Counts)> {
    let mut dump = Map::new();
    let mut counts = Counts::new();

    for name in exported_collections(db) {
        let schema = db.schema(&name);
        let docs = db.collection(&name)?.list().await?;
        counts.insert(name.clone(), docs.len());
        let items = docs.into_iter().map(|d| document_to_json(d, schema)).collect();
        dump.insert(name, serde_json::Value::Array(items));
    }

    Ok((serde_json::Value::Object(dump), counts))
}

pub async fn export_to_file(db: &Database, path: &Path) -> Result<Counts> {
    let (dump, counts) = export_json(db).await?;
    let content = serde_json::to_string_pretty(&dump)?;
    tokio::fs::write(path, content)
        .await
        .map_err(|source| Error::FileWriteError {
            path: path.to_path_buf(),
            source,
        })?;
    tracing::info!("Exported {} documents to {:?}", counts.values().sum::<usize>(), path);
    Ok(counts)
}

/// Upsert every document of a dump, committing once.
///
/// Collections are restored in dependency order; references are not checked
/// since the dump is expected to be self-consistent.
pub async fn import_json(db: &Database, dump: &serde_json::Value) -> Result<Counts> {
    let object = dump.as_object().ok_or_else(|| Error::JsonParseError {
        message: "export must be an object keyed by collection".to_string(),
    })?;

    let known = exported_collections(db);
    if let Some(unknown) = object.keys().find(|k| !known.contains(k)) {
        return Err(Error::InvalidArgument {
            message: format!("unknown collection '{}' in import", unknown),
        });
    }

    let mut tx = db.transaction("Import collections");
    let mut counts = Counts::new();

    for name in known {
        let Some(items) = object.get(&name) else {
            continue;
        };
        let items = items.as_array().ok_or_else(|| Error::JsonParseError {
            message: format!("{}: expected an array of documents", name),
        })?;

        let schema = db.schema(&name);
        db.collection(&name)?.ensure_exists().await?;
        for item in items {
            let doc = document_from_json(&name, item, schema)?;
            db.upsert(&name, &doc).await?;
        }
        tx.record(format!("{}: {} documents", name, items.len()));
        counts.insert(name, items.len());
    }

    db.commit_transaction(tx)?;
    Ok(counts)
}

pub async fn import_from_file(db: &Database, path: &Path) -> Result<Counts> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::FileReadError {
            path: path.to_path_buf(),
            source,
        })?;
    let dump: serde_json::Value = serde_json::from_str(&content)?;
    let counts = import_json(db, &dump).await?;
    tracing::info!("Imported {} documents from {:?}", counts.values().sum::<usize>(), path);
    Ok(counts)
}
