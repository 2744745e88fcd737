//! A student's enrollment in a course

use super::{Entity, EnrollmentStatus, Fields};
use crate::error::Result;
use crate::schema::catalog::ENROLLMENTS;
use crate::storage::document::Document;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enrollment {
    pub id: String,
    pub student_id: String,
    pub course_id: String,
    pub enrollment_date: DateTime<Utc>,
    pub status: EnrollmentStatus,
}

impl Entity for Enrollment {
    const COLLECTION: &'static str = ENROLLMENTS;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new(&self.id);
        doc.set("student_id", &self.student_id)
            .set("course_id", &self.course_id)
            .set("enrollment_date", self.enrollment_date)
            .set("status", self.status);
        doc
    }

    fn from_document(doc: &Document) -> Result<Self> {
        let f = Fields::of(doc, ENROLLMENTS);
        Ok(Self {
            id: doc.id.clone(),
            student_id: f.string("student_id")?,
            course_id: f.string("course_id")?,
            enrollment_date: f.datetime("enrollment_date")?,
            status: f.parsed("status")?,
        })
    }
}
