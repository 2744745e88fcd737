//! YAML frontmatter parsing and rendering
//!
//! Markdown files use YAML frontmatter delimited by `---`:
//!
//! ```markdown
//! ---
//! title: Ownership basics
//! order: 1
//! created_at: !datetime 2024-03-01T09:30:00Z
//! ---
//!
//! # Lesson content here
//! ```
//!
//! Timestamps carry the `!datetime` tag so they come back as
//! [`Value::DateTime`] rather than plain strings.

use super::document::{Fields, Value};
use crate::error::Error;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_yaml::value::{Tag, TaggedValue};
use std::collections::BTreeMap;

const DATETIME_TAG: &str = "datetime";

/// Parse YAML frontmatter from markdown content
pub fn parse(content: &str) -> crate::Result<(Fields, String)> {
    let content = content.trim_start();

    // No frontmatter, entire content is body
    if !content.starts_with("---") {
        return Ok((Fields::new(), content.to_string()));
    }

    let rest = &content[3..];
    let end_pos = rest.find("\n---").ok_or_else(|| Error::YamlParseError {
        message: "unclosed frontmatter: missing closing ---".to_string(),
    })?;

    let yaml_content = rest[..end_pos].trim();
    let after = &rest[end_pos + 4..]; // Skip past "\n---"

    // End of the closing delimiter line, then the one blank separator line
    let after = after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
        .unwrap_or(after);
    let body = after.strip_prefix('\n').unwrap_or(after).to_string();

    let yaml_value: serde_yaml::Value = serde_yaml::from_str(yaml_content)?;
    let fields = yaml_to_fields(yaml_value)?;

    Ok((fields, body))
}

/// Convert serde_yaml::Value to our Fields type
fn yaml_to_fields(value: serde_yaml::Value) -> crate::Result<Fields> {
    match value {
        serde_yaml::Value::Mapping(map) => {
            let mut fields = Fields::new();
            for (k, v) in map {
                let key = k
                    .as_str()
                    .ok_or_else(|| Error::YamlParseError {
                        message: "non-string key in frontmatter".to_string(),
                    })?
                    .to_string();
                fields.insert(key, yaml_value_to_value(v)?);
            }
            Ok(fields)
        }
        serde_yaml::Value::Null => Ok(Fields::new()),
        _ => Err(Error::YamlParseError {
            message: "frontmatter must be a YAML mapping".to_string(),
        }),
    }
}

/// Convert a serde_yaml::Value to our Value type
fn yaml_value_to_value(v: serde_yaml::Value) -> crate::Result<Value> {
    Ok(match v {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Null
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => Value::Array(
            seq.into_iter()
                .map(yaml_value_to_value)
                .collect::<crate::Result<_>>()?,
        ),
        serde_yaml::Value::Mapping(map) => {
            let mut obj = BTreeMap::new();
            for (k, v) in map {
                if let Some(key) = k.as_str() {
                    obj.insert(key.to_string(), yaml_value_to_value(v)?);
                }
            }
            Value::Object(obj)
        }
        serde_yaml::Value::Tagged(tagged) => {
            if tagged.tag == DATETIME_TAG {
                let raw = tagged.value.as_str().ok_or_else(|| Error::YamlParseError {
                    message: "!datetime value must be a string".to_string(),
                })?;
                Value::DateTime(parse_datetime(raw)?)
            } else {
                yaml_value_to_value(tagged.value)?
            }
        }
    })
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_datetime(raw: &str) -> crate::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::YamlParseError {
            message: format!("invalid timestamp '{}': {}", raw, e),
        })
}

/// Render a timestamp the way it is stored and exported
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Convert our Value to serde_yaml::Value
fn value_to_yaml(v: &Value) -> serde_yaml::Value {
    match v {
        Value::Null => serde_yaml::Value::Null,
        Value::Bool(b) => serde_yaml::Value::Bool(*b),
        Value::Int(i) => serde_yaml::Value::Number((*i).into()),
        Value::Float(f) => serde_yaml::Value::Number(serde_yaml::Number::from(*f)),
        Value::String(s) => serde_yaml::Value::String(s.clone()),
        Value::DateTime(dt) => serde_yaml::Value::Tagged(Box::new(TaggedValue {
            tag: Tag::new(DATETIME_TAG),
            value: serde_yaml::Value::String(format_datetime(dt)),
        })),
        Value::Array(arr) => serde_yaml::Value::Sequence(arr.iter().map(value_to_yaml).collect()),
        Value::Object(obj) => {
            let map: serde_yaml::Mapping = obj
                .iter()
                .map(|(k, v)| (serde_yaml::Value::String(k.clone()), value_to_yaml(v)))
                .collect();
            serde_yaml::Value::Mapping(map)
        }
    }
}

/// Render fields and body back to markdown with frontmatter
pub fn render(fields: &Fields, body: &str) -> crate::Result<String> {
    if fields.is_empty() {
        return Ok(body.to_string());
    }

    let yaml_map: serde_yaml::Mapping = fields
        .iter()
        .map(|(k, v)| (serde_yaml::Value::String(k.clone()), value_to_yaml(v)))
        .collect();

    let yaml_str = serde_yaml::to_string(&serde_yaml::Value::Mapping(yaml_map)).map_err(|e| {
        Error::YamlSerializeError {
            message: e.to_string(),
        }
    })?;

    Ok(format!("---\n{}---\n\n{}", yaml_str, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_frontmatter() {
        let content = r#"---
title: Intro to Python
order: 2
price: 49.5
due_date: !datetime 2024-05-01T12:00:00Z
tags:
  - python
  - beginner
---

# Lesson

Some content here.
"#;

        let (fields, body) = parse(content).unwrap();

        assert_eq!(fields.get("title"), Some(&Value::String("Intro to Python".into())));
        assert_eq!(fields.get("order"), Some(&Value::Int(2)));
        assert_eq!(fields.get("price"), Some(&Value::Float(49.5)));
        assert_eq!(
            fields.get("due_date"),
            Some(&Value::DateTime(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()))
        );
        assert!(body.contains("# Lesson"));
    }

    #[test]
    fn test_no_frontmatter() {
        let content = "# Just a document\n\nWith no frontmatter.";
        let (fields, body) = parse(content).unwrap();

        assert!(fields.is_empty());
        assert!(body.contains("Just a document"));
    }

    #[test]
    fn test_unclosed_frontmatter() {
        assert!(parse("---\ntitle: x\n").is_err());
    }

    #[test]
    fn test_float_stays_float() {
        let mut fields = Fields::new();
        fields.insert("grade".into(), Value::Float(85.0));
        fields.insert("order".into(), Value::Int(3));

        let rendered = render(&fields, "").unwrap();
        let (parsed, _) = parse(&rendered).unwrap();

        assert_eq!(parsed.get("grade"), Some(&Value::Float(85.0)));
        assert_eq!(parsed.get("order"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_body_round_trips_exactly() {
        let mut fields = Fields::new();
        fields.insert("title".into(), Value::from("Lesson 1: Ownership"));

        for body in ["\n\nStarts after blank lines.", "No leading newline.", "", "\n"] {
            let rendered = render(&fields, body).unwrap();
            let (_, parsed) = parse(&rendered).unwrap();
            assert_eq!(parsed, body);
        }

        let (_, tight) = parse("---\ntitle: x\n---\n# Heading").unwrap();
        assert_eq!(tight, "# Heading");
    }
}
