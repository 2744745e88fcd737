//! Student submissions for assignments

use super::{set_opt, Entity, Fields};
use crate::error::Result;
use crate::schema::catalog::SUBMISSIONS;
use crate::storage::document::Document;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub id: String,
    pub assignment_id: String,
    pub student_id: String,
    pub submission_date: DateTime<Utc>,
    pub content: String,
    /// `None` until graded
    pub grade: Option<f64>,
    pub feedback: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Submission {
    const COLLECTION: &'static str = SUBMISSIONS;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new(&self.id);
        doc.set("assignment_id", &self.assignment_id)
            .set("student_id", &self.student_id)
            .set("submission_date", self.submission_date)
            .set("content", &self.content)
            .set("grade", self.grade)
            .set("feedback", self.feedback.clone());
        set_opt(&mut doc, "created_at", self.created_at);
        set_opt(&mut doc, "updated_at", self.updated_at);
        doc
    }

    fn from_document(doc: &Document) -> Result<Self> {
        let f = Fields::of(doc, SUBMISSIONS);
        Ok(Self {
            id: doc.id.clone(),
            assignment_id: f.string("assignment_id")?,
            student_id: f.string("student_id")?,
            submission_date: f.datetime("submission_date")?,
            content: f.string("content")?,
            grade: f.opt_float("grade")?,
            feedback: f.opt_string("feedback")?,
            created_at: f.opt_datetime("created_at")?,
            updated_at: f.opt_datetime("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::document::Value;

    #[test]
    fn test_ungraded_submission_writes_nulls() {
        let sub = Submission {
            id: "s-1".into(),
            assignment_id: "a-1".into(),
            student_id: "u-1".into(),
            submission_date: Utc::now(),
            content: "My essay".into(),
            grade: None,
            feedback: None,
            created_at: None,
            updated_at: None,
        };

        let doc = sub.to_document();
        assert_eq!(doc.get("grade"), Some(&Value::Null));
        assert_eq!(Submission::from_document(&doc).unwrap(), sub);
    }
}
