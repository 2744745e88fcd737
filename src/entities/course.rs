//! Courses

use super::{set_opt, Entity, Fields, Level};
use crate::error::{Error, Result};
use crate::features::geo::GeoPoint;
use crate::schema::catalog::COURSES;
use crate::storage::document::Document;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub instructor_id: String,
    pub category: Option<String>,
    pub level: Option<Level>,
    /// Hours
    pub duration: Option<f64>,
    pub price: Option<f64>,
    pub tags: Vec<String>,
    pub is_published: bool,
    pub location: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Course {
    const COLLECTION: &'static str = COURSES;

    fn id(&self) -> &str {
        &self.id
    }

    fn to_document(&self) -> Document {
        let mut doc = Document::new(&self.id);
        doc.set("title", &self.title)
            .set("description", &self.description)
            .set("instructor_id", &self.instructor_id)
            .set("tags", self.tags.clone())
            .set("is_published", self.is_published)
            .set("created_at", self.created_at)
            .set("updated_at", self.updated_at);
        set_opt(&mut doc, "category", self.category.clone());
        set_opt(&mut doc, "level", self.level);
        set_opt(&mut doc, "duration", self.duration);
        set_opt(&mut doc, "price", self.price);
        set_opt(&mut doc, "location", self.location.map(|p| p.to_value()));
        doc
    }

    fn from_document(doc: &Document) -> Result<Self> {
        let f = Fields::of(doc, COURSES);
        let location = match f.value("location") {
            None => None,
            Some(v) => Some(GeoPoint::from_value(v).ok_or_else(|| Error::TypeMismatch {
                collection: COURSES.to_string(),
                field: "location".to_string(),
                expected: "geopoint".to_string(),
                actual: v.type_name().to_string(),
            })?),
        };

        Ok(Self {
            id: doc.id.clone(),
            title: f.string("title")?,
            description: f.string("description")?,
            instructor_id: f.string("instructor_id")?,
            category: f.opt_string("category")?,
            level: f.opt_parsed("level")?,
            duration: f.opt_float("duration")?,
            price: f.opt_float("price")?,
            tags: f.strings("tags")?,
            is_published: f.bool_or("is_published", false)?,
            location,
            created_at: f.datetime("created_at")?,
            updated_at: f.datetime("updated_at")?,
        })
    }
}
