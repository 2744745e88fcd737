//! Declarative aggregation pipelines
//!
//! A pipeline starts from every document of one collection and threads the
//! resulting rows through its stages in order:
//!
//! ```text
//! collection ─► Match ─► Lookup ─► Unwind ─► Group ─► AddFields ─► Sort ─► Limit ─► rows
//! ```
//!
//! Rows are plain field maps. A document becomes a row holding `_id`, its
//! frontmatter fields, and (for collections with a body field) the body under
//! that field's name. Joins are inner joins once unwound: a row whose lookup
//! found nothing is dropped by the following `Unwind`.

use crate::error::Result;
use crate::query::filter::{compare_for_sort, values_equal, FieldSource, Filter};
use crate::storage::document::{Document, Value};
use crate::Database;
use chrono::Datelike;
use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// One pipeline row
pub type Row = BTreeMap<String, Value>;

/// A computed value
#[derive(Debug, Clone)]
pub enum Expr {
    /// Field path, dotted paths descend into objects
    Field(String),
    Literal(Value),
    /// String concatenation; null if any part is not a string
    Concat(Vec<Expr>),
    /// Round to the given number of decimals
    Round(Box<Expr>, u32),
    /// Null when the divisor is zero or either side is not a number
    Divide(Box<Expr>, Box<Expr>),
    Multiply(Box<Expr>, Box<Expr>),
    /// Length of an array
    Size(Box<Expr>),
    Year(Box<Expr>),
    Month(Box<Expr>),
    /// First expression, or the second when the first is null
    IfNull(Box<Expr>, Box<Expr>),
    /// Object built from named expressions
    Object(Vec<(String, Expr)>),
}

impl Expr {
    pub fn field(path: impl Into<String>) -> Self {
        Expr::Field(path.into())
    }

    pub fn lit(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn round(self, places: u32) -> Self {
        Expr::Round(Box::new(self), places)
    }

    pub fn divide(self, by: Expr) -> Self {
        Expr::Divide(Box::new(self), Box::new(by))
    }

    pub fn multiply(self, by: Expr) -> Self {
        Expr::Multiply(Box::new(self), Box::new(by))
    }

    pub fn size(self) -> Self {
        Expr::Size(Box::new(self))
    }

    pub fn year(self) -> Self {
        Expr::Year(Box::new(self))
    }

    pub fn month(self) -> Self {
        Expr::Month(Box::new(self))
    }

    pub fn or_else(self, fallback: Expr) -> Self {
        Expr::IfNull(Box::new(self), Box::new(fallback))
    }

    /// `first last` from two name fields of a joined user
    pub fn full_name(prefix: &str) -> Self {
        Expr::Concat(vec![
            Expr::field(format!("{}.first_name", prefix)),
            Expr::lit(" "),
            Expr::field(format!("{}.last_name", prefix)),
        ])
    }

    pub fn eval(&self, row: &Row) -> Value {
        match self {
            Expr::Field(path) => row.field(path).unwrap_or(Value::Null),
            Expr::Literal(v) => v.clone(),
            Expr::Concat(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part.eval(row) {
                        Value::String(s) => out.push_str(&s),
                        _ => return Value::Null,
                    }
                }
                Value::String(out)
            }
            Expr::Round(inner, places) => match inner.eval(row) {
                Value::Float(f) => Value::Float(round_to(f, *places)),
                other => other,
            },
            Expr::Divide(a, b) => match (a.eval(row).as_f64(), b.eval(row).as_f64()) {
                (Some(x), Some(y)) if y != 0.0 => Value::Float(x / y),
                _ => Value::Null,
            },
            Expr::Multiply(a, b) => match (a.eval(row), b.eval(row)) {
                (Value::Int(x), Value::Int(y)) => match x.checked_mul(y) {
                    Some(product) => Value::Int(product),
                    None => Value::Float(x as f64 * y as f64),
                },
                (x, y) => match (x.as_f64(), y.as_f64()) {
                    (Some(x), Some(y)) => Value::Float(x * y),
                    _ => Value::Null,
                },
            },
            Expr::Size(inner) => match inner.eval(row) {
                Value::Array(items) => Value::from(items.len()),
                _ => Value::Null,
            },
            Expr::Year(inner) => match inner.eval(row) {
                Value::DateTime(dt) => Value::Int(dt.year() as i64),
                _ => Value::Null,
            },
            Expr::Month(inner) => match inner.eval(row) {
                Value::DateTime(dt) => Value::Int(dt.month() as i64),
                _ => Value::Null,
            },
            Expr::IfNull(inner, fallback) => match inner.eval(row) {
                Value::Null => fallback.eval(row),
                v => v,
            },
            Expr::Object(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(name, expr)| (name.clone(), expr.eval(row)))
                    .collect(),
            ),
        }
    }
}

pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Per-group accumulator
#[derive(Debug, Clone)]
pub enum Accumulator {
    /// Number of rows
    Count,
    /// Sum of numeric values; non-numbers are skipped
    Sum(Expr),
    /// Mean of numeric values; null when there are none
    Avg(Expr),
    /// Distinct values, in first-seen order
    AddToSet(Expr),
    /// Number of rows matching a filter
    CountIf(Filter),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub enum Stage {
    Match(Filter),
    /// Attach all documents of `from` whose `foreign_field` equals this
    /// row's `local_field`, as an array under `as_field`
    Lookup {
        from: String,
        local_field: String,
        foreign_field: String,
        as_field: String,
    },
    /// One row per element of an array field; rows with a missing or empty
    /// array are dropped
    Unwind(String),
    /// Group rows by a key; output rows hold `_id` plus the accumulators
    Group {
        key: Expr,
        accumulators: Vec<(String, Accumulator)>,
    },
    AddFields(Vec<(String, Expr)>),
    /// Replace each row by the listed computed fields
    Project(Vec<(String, Expr)>),
    Sort(Vec<(String, SortOrder)>),
    Limit(usize),
}

/// A sequence of stages over one source collection
#[derive(Debug, Clone)]
pub struct Pipeline {
    source: String,
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn over(collection: impl Into<String>) -> Self {
        Self {
            source: collection.into(),
            stages: Vec::new(),
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn filter(self, filter: Filter) -> Self {
        self.stage(Stage::Match(filter))
    }

    /// Inner join: lookup followed by unwind of the joined field
    pub fn join(self, from: &str, local_field: &str, foreign_field: &str, as_field: &str) -> Self {
        self.stage(Stage::Lookup {
            from: from.to_string(),
            local_field: local_field.to_string(),
            foreign_field: foreign_field.to_string(),
            as_field: as_field.to_string(),
        })
        .stage(Stage::Unwind(as_field.to_string()))
    }

    pub fn group(self, key: Expr, accumulators: Vec<(&str, Accumulator)>) -> Self {
        self.stage(Stage::Group {
            key,
            accumulators: accumulators
                .into_iter()
                .map(|(name, acc)| (name.to_string(), acc))
                .collect(),
        })
    }

    pub fn add_fields(self, fields: Vec<(&str, Expr)>) -> Self {
        self.stage(Stage::AddFields(named(fields)))
    }

    pub fn project(self, fields: Vec<(&str, Expr)>) -> Self {
        self.stage(Stage::Project(named(fields)))
    }

    pub fn sort(self, keys: Vec<(&str, SortOrder)>) -> Self {
        self.stage(Stage::Sort(
            keys.into_iter().map(|(k, o)| (k.to_string(), o)).collect(),
        ))
    }

    pub fn limit(self, n: usize) -> Self {
        self.stage(Stage::Limit(n))
    }

    /// Evaluate the pipeline
    pub async fn run(&self, db: &Database) -> Result<Vec<Row>> {
        let mut tables: HashMap<String, Vec<Row>> = HashMap::new();
        let mut rows = load_rows(db, &self.source).await?;

        for stage in &self.stages {
            rows = match stage {
                Stage::Match(filter) => rows.into_iter().filter(|r| filter.matches(r)).collect(),
                Stage::Lookup {
                    from,
                    local_field,
                    foreign_field,
                    as_field,
                } => {
                    if !tables.contains_key(from) {
                        tables.insert(from.clone(), load_rows(db, from).await?);
                    }
                    let foreign = tables.get(from).map(Vec::as_slice).unwrap_or_default();
                    lookup(rows, foreign, local_field, foreign_field, as_field)
                }
                Stage::Unwind(field) => unwind(rows, field),
                Stage::Group { key, accumulators } => group(rows, key, accumulators),
                Stage::AddFields(fields) => rows
                    .into_iter()
                    .map(|mut row| {
                        for (name, expr) in fields {
                            let value = expr.eval(&row);
                            row.insert(name.clone(), value);
                        }
                        row
                    })
                    .collect(),
                Stage::Project(fields) => rows
                    .into_iter()
                    .map(|row| {
                        fields
                            .iter()
                            .map(|(name, expr)| (name.clone(), expr.eval(&row)))
                            .collect()
                    })
                    .collect(),
                Stage::Sort(keys) => {
                    let mut rows = rows;
                    rows.sort_by(|a, b| compare_rows(a, b, keys));
                    rows
                }
                Stage::Limit(n) => {
                    let mut rows = rows;
                    rows.truncate(*n);
                    rows
                }
            };
            tracing::debug!("{} pipeline: {} rows after {}", self.source, rows.len(), stage_name(stage));
        }

        Ok(rows)
    }

    /// Evaluate the pipeline and deserialize each row
    pub async fn run_as<T: DeserializeOwned>(&self, db: &Database) -> Result<Vec<T>> {
        self.run(db)
            .await?
            .into_iter()
            .map(|row| {
                let json = serde_json::to_value(&row)?;
                Ok(serde_json::from_value(json)?)
            })
            .collect()
    }
}

fn named(fields: Vec<(&str, Expr)>) -> Vec<(String, Expr)> {
    fields.into_iter().map(|(n, e)| (n.to_string(), e)).collect()
}

fn stage_name(stage: &Stage) -> &'static str {
    match stage {
        Stage::Match(_) => "match",
        Stage::Lookup { .. } => "lookup",
        Stage::Unwind(_) => "unwind",
        Stage::Group { .. } => "group",
        Stage::AddFields(_) => "add_fields",
        Stage::Project(_) => "project",
        Stage::Sort(_) => "sort",
        Stage::Limit(_) => "limit",
    }
}

async fn load_rows(db: &Database, collection: &str) -> Result<Vec<Row>> {
    let body_field = db
        .schema(collection)
        .and_then(|s| s.body_field.clone());
    let docs = db.collection(collection)?.list().await?;
    Ok(docs
        .into_iter()
        .map(|doc| document_row(doc, body_field.as_deref()))
        .collect())
}

/// Turn a document into a pipeline row
pub fn document_row(doc: Document, body_field: Option<&str>) -> Row {
    let mut row = doc.fields;
    if let Some(field) = body_field {
        row.insert(field.to_string(), Value::String(doc.body));
    }
    row.insert("_id".to_string(), Value::String(doc.id));
    row
}

fn lookup(rows: Vec<Row>, foreign: &[Row], local: &str, foreign_field: &str, as_field: &str) -> Vec<Row> {
    rows.into_iter()
        .map(|mut row| {
            let key = row.field(local).unwrap_or(Value::Null);
            let matches: Vec<Value> = foreign
                .iter()
                .filter(|other| {
                    let theirs = other.field(foreign_field).unwrap_or(Value::Null);
                    !key.is_null() && values_equal(&key, &theirs)
                })
                .map(|other| Value::Object(other.clone()))
                .collect();
            row.insert(as_field.to_string(), Value::Array(matches));
            row
        })
        .collect()
}

fn unwind(rows: Vec<Row>, field: &str) -> Vec<Row> {
    rows.into_iter()
        .flat_map(|row| match row.get(field) {
            Some(Value::Array(items)) => items
                .clone()
                .into_iter()
                .map(|item| {
                    let mut out = row.clone();
                    out.insert(field.to_string(), item);
                    out
                })
                .collect::<Vec<_>>(),
            Some(Value::Null) | None => Vec::new(),
            Some(_) => vec![row],
        })
        .collect()
}

fn group(rows: Vec<Row>, key: &Expr, accumulators: &[(String, Accumulator)]) -> Vec<Row> {
    // Groups keep first-seen order; keys are compared by value
    let mut groups: Vec<(Value, Vec<Row>)> = Vec::new();
    for row in rows {
        let k = key.eval(&row);
        match groups.iter_mut().find(|(existing, _)| *existing == k) {
            Some((_, members)) => members.push(row),
            None => groups.push((k, vec![row])),
        }
    }

    groups
        .into_iter()
        .map(|(k, members)| {
            let mut out = Row::new();
            out.insert("_id".to_string(), k);
            for (name, acc) in accumulators {
                out.insert(name.clone(), accumulate(acc, &members));
            }
            out
        })
        .collect()
}

fn accumulate(acc: &Accumulator, rows: &[Row]) -> Value {
    match acc {
        Accumulator::Count => Value::from(rows.len()),
        Accumulator::CountIf(filter) => Value::from(rows.iter().filter(|r| filter.matches(*r)).count()),
        Accumulator::Sum(expr) => {
            let values: Vec<Value> = rows.iter().map(|r| expr.eval(r)).collect();
            let int_total = values
                .iter()
                .all(|v| matches!(v, Value::Int(_) | Value::Null))
                .then(|| {
                    values
                        .iter()
                        .filter_map(Value::as_i64)
                        .try_fold(0i64, |total, v| total.checked_add(v))
                })
                .flatten();
            match int_total {
                Some(total) => Value::Int(total),
                // Mixed numbers, or integers that overflow
                None => Value::Float(values.iter().filter_map(Value::as_f64).sum()),
            }
        }
        Accumulator::Avg(expr) => {
            let values: Vec<f64> = rows.iter().filter_map(|r| expr.eval(r).as_f64()).collect();
            if values.is_empty() {
                Value::Null
            } else {
                Value::Float(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        Accumulator::AddToSet(expr) => {
            let mut set: Vec<Value> = Vec::new();
            for v in rows.iter().map(|r| expr.eval(r)) {
                if !set.contains(&v) {
                    set.push(v);
                }
            }
            Value::Array(set)
        }
    }
}

fn compare_rows(a: &Row, b: &Row, keys: &[(String, SortOrder)]) -> Ordering {
    for (field, order) in keys {
        let cmp = compare_for_sort(a.field(field).as_ref(), b.field(field).as_ref());
        if cmp != Ordering::Equal {
            return match order {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            };
        }
    }
    Ordering::Equal
}
