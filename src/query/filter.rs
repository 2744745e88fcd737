//! Filter predicates evaluated against documents and pipeline rows
//!
//! Field names are resolved through [`FieldSource`], so `_id` and dotted
//! paths work everywhere. Matching follows document-store
//! conventions: a missing field equals `null`, and a scalar condition on an
//! array field matches when any element matches.

use crate::error::{Error, Result};
use crate::storage::document::{Document, Value};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Anything a filter can read fields from
pub trait FieldSource {
    fn field(&self, path: &str) -> Option<Value>;
}

impl FieldSource for Document {
    fn field(&self, path: &str) -> Option<Value> {
        self.get_field(path)
    }
}

impl FieldSource for BTreeMap<String, Value> {
    fn field(&self, path: &str) -> Option<Value> {
        match path.split_once('.') {
            None => self.get(path).cloned(),
            Some((head, rest)) => self.get(head)?.get_path(rest).cloned(),
        }
    }
}

/// A predicate over a document
#[derive(Debug, Clone)]
pub enum Filter {
    /// Matches every document
    All,
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    Regex(String, Regex),
    Exists(String, bool),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ne(field.into(), value.into())
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt(field.into(), value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gte(field.into(), value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lt(field.into(), value.into())
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lte(field.into(), value.into())
    }

    /// Inclusive range
    pub fn between(field: impl Into<String>, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        let field = field.into();
        Filter::And(vec![
            Filter::Gte(field.clone(), low.into()),
            Filter::Lte(field, high.into()),
        ])
    }

    pub fn any_of<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// Case-insensitive substring match; `needle` is taken literally
    pub fn contains_ci(field: impl Into<String>, needle: &str) -> Result<Self> {
        Self::regex(field, &format!("(?i){}", regex::escape(needle)))
    }

    /// Case-insensitive whole-value match; `text` is taken literally
    pub fn equals_ci(field: impl Into<String>, text: &str) -> Result<Self> {
        Self::regex(field, &format!("(?i)^{}$", regex::escape(text)))
    }

    pub fn regex(field: impl Into<String>, pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern).map_err(|e| Error::InvalidArgument {
            message: format!("invalid pattern '{}': {}", pattern, e),
        })?;
        Ok(Filter::Regex(field.into(), re))
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Filter::Exists(field.into(), true)
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::All => other,
            Filter::And(mut parts) => {
                parts.push(other);
                Filter::And(parts)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Filter) -> Self {
        match self {
            Filter::Or(mut parts) => {
                parts.push(other);
                Filter::Or(parts)
            }
            first => Filter::Or(vec![first, other]),
        }
    }

    pub fn negate(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Evaluate this filter against a document or row
    pub fn matches<S: FieldSource + ?Sized>(&self, doc: &S) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(field, expected) => field_equals(doc.field(field).as_ref(), expected),
            Filter::Ne(field, expected) => !field_equals(doc.field(field).as_ref(), expected),
            Filter::Gt(field, bound) => compares(doc, field, bound, |o| o == Ordering::Greater),
            Filter::Gte(field, bound) => compares(doc, field, bound, |o| o != Ordering::Less),
            Filter::Lt(field, bound) => compares(doc, field, bound, |o| o == Ordering::Less),
            Filter::Lte(field, bound) => compares(doc, field, bound, |o| o != Ordering::Greater),
            Filter::In(field, options) => {
                let actual = doc.field(field);
                options.iter().any(|opt| field_equals(actual.as_ref(), opt))
            }
            Filter::Regex(field, re) => match doc.field(field) {
                Some(Value::String(s)) => re.is_match(&s),
                Some(Value::Array(items)) => items
                    .iter()
                    .any(|item| item.as_str().map(|s| re.is_match(s)).unwrap_or(false)),
                _ => false,
            },
            Filter::Exists(field, wanted) => doc.field(field).is_some() == *wanted,
            Filter::And(parts) => parts.iter().all(|p| p.matches(doc)),
            Filter::Or(parts) => parts.iter().any(|p| p.matches(doc)),
            Filter::Not(inner) => !inner.matches(doc),
        }
    }
}

fn field_equals(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::Array(items)) if !matches!(expected, Value::Array(_)) => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(value) => values_equal(value, expected),
    }
}

fn compares<S: FieldSource + ?Sized>(doc: &S, field: &str, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    match doc.field(field) {
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| compare_values(item, bound).map(&accept).unwrap_or(false)),
        Some(value) => compare_values(&value, bound).map(accept).unwrap_or(false),
        None => false,
    }
}

/// Equality with int/float unification
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            a.as_f64() == b.as_f64()
        }
        _ => a == b,
    }
}

/// Ordering between values of comparable types, `None` across types
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::DateTime(x), Value::DateTime(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Total order used for sorting: missing and null first, then numbers,
/// strings, booleans, timestamps, and everything else.
pub fn compare_for_sort(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Int(_) | Value::Float(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(Value::Bool(_)) => 3,
            Some(Value::DateTime(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or_else(|| rank(a).cmp(&rank(b))),
        _ => rank(a).cmp(&rank(b)),
    }
}
