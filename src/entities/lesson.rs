//! Lessons; the lesson content is the markdown body of the document

use super::{set_opt, Entity, Fields};
use crate::error::Result;
use crate::schema::catalog::LESSONS;
use crate::storage::document::Document;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lesson {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub content: String,
    /// Position within the course, dense from 1
    pub order: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Lesson {
    const COLLECTION: &'static str = LESSONS;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new(&self.id).with_body(&self.content);
        doc.set("course_id", &self.course_id)
            .set("title", &self.title)
            .set("order", self.order);
        set_opt(&mut doc, "created_at", self.created_at);
        set_opt(&mut doc, "updated_at", self.updated_at);
        doc
    }

    fn from_document(doc: &Document) -> Result<Self> {
        let f = Fields::of(doc, LESSONS);
        Ok(Self {
            id: doc.id.clone(),
            course_id: f.string("course_id")?,
            title: f.string("title")?,
            content: doc.body.clone(),
            order: f.int("order")?,
            created_at: f.opt_datetime("created_at")?,
            updated_at: f.opt_datetime("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_lives_in_body() {
        let lesson = Lesson {
            id: "l-1".into(),
            course_id: "c-1".into(),
            title: "Lesson 1: Basics".into(),
            content: "# Basics\n\nVariables hold values.".into(),
            order: 1,
            created_at: None,
            updated_at: None,
        };

        let doc = lesson.to_document();
        assert!(doc.get("content").is_none());
        assert_eq!(doc.body, lesson.content);

        let rendered = doc.render().unwrap();
        let parsed = Document::parse("l-1", &rendered).unwrap();
        assert_eq!(Lesson::from_document(&parsed).unwrap(), lesson);
    }
}
