//! Assignments attached to lessons

use super::{set_opt, Entity, Fields};
use crate::error::Result;
use crate::schema::catalog::ASSIGNMENTS;
use crate::storage::document::Document;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub id: String,
    pub lesson_id: String,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub max_score: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Assignment {
    const COLLECTION: &'static str = ASSIGNMENTS;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new(&self.id);
        doc.set("lesson_id", &self.lesson_id)
            .set("title", &self.title)
            .set("description", &self.description)
            .set("due_date", self.due_date);
        set_opt(&mut doc, "max_score", self.max_score);
        set_opt(&mut doc, "created_at", self.created_at);
        set_opt(&mut doc, "updated_at", self.updated_at);
        doc
    }

    fn from_document(doc: &Document) -> Result<Self> {
        let f = Fields::of(doc, ASSIGNMENTS);
        Ok(Self {
            id: doc.id.clone(),
            lesson_id: f.string("lesson_id")?,
            title: f.string("title")?,
            description: f.string("description")?,
            due_date: f.datetime("due_date")?,
            max_score: f.opt_float("max_score")?,
            created_at: f.opt_datetime("created_at")?,
            updated_at: f.opt_datetime("updated_at")?,
        })
    }
}
