//! Entity repositories
//!
//! Every write path checks the entities it points at before touching the
//! store, then commits. A failed check leaves the store untouched.

pub mod assignments;
pub mod courses;
pub mod enrollments;
pub mod lessons;
pub mod submissions;
pub mod users;

use crate::entities::{Assignment, Course, Enrollment, Entity, Lesson, Submission, User};
use crate::error::{Error, Result};
use crate::query::filter::Filter;
use crate::schema::catalog::{ASSIGNMENTS, COURSES, LESSONS, USERS};
use crate::Database;

/// Foreign keys an entity carries
pub trait References {
    /// `(collection, id)` pairs that must exist before this entity is written
    fn references(&self) -> Vec<(&'static str, &str)>;
}

impl References for User {
    fn references(&self) -> Vec<(&'static str, &str)> {
        Vec::new()
    }
}

impl References for Course {
    fn references(&self) -> Vec<(&'static str, &str)> {
        vec![(USERS, &self.instructor_id)]
    }
}

impl References for Enrollment {
    fn references(&self) -> Vec<(&'static str, &str)> {
        vec![(USERS, &self.student_id), (COURSES, &self.course_id)]
    }
}

impl References for Lesson {
    fn references(&self) -> Vec<(&'static str, &str)> {
        vec![(COURSES, &self.course_id)]
    }
}

impl References for Assignment {
    fn references(&self) -> Vec<(&'static str, &str)> {
        vec![(LESSONS, &self.lesson_id)]
    }
}

impl References for Submission {
    fn references(&self) -> Vec<(&'static str, &str)> {
        vec![(ASSIGNMENTS, &self.assignment_id), (USERS, &self.student_id)]
    }
}

/// Fail with `NotFound` on the first referenced entity that is missing
pub async fn ensure_references<E: References>(db: &Database, entity: &E) -> Result<()> {
    for (collection, id) in entity.references() {
        if !db.exists(collection, id).await? {
            return Err(Error::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

/// Check references, insert, and commit a new entity
pub(crate) async fn insert<E: Entity + References>(db: &Database, entity: &E) -> Result<()> {
    let result = async {
        ensure_references(db, entity).await?;
        db.insert(E::COLLECTION, &entity.to_document()).await?;
        db.commit(&format!("Insert into {}: {}", E::COLLECTION, entity.id()))
    }
    .await;

    match &result {
        Ok(()) => tracing::info!("Inserted {} into {}", entity.id(), E::COLLECTION),
        Err(e) => tracing::warn!("Abandoned insert into {}: {}", E::COLLECTION, e),
    }
    result
}

/// Overwrite an existing entity and commit
pub(crate) async fn save<E: Entity>(db: &Database, entity: &E, action: &str) -> Result<()> {
    db.update(E::COLLECTION, &entity.to_document())
        .await
        .inspect_err(|e| tracing::warn!("Abandoned {} of {}: {}", action, entity.id(), e))?;
    db.commit(&format!("{} {}: {}", action, E::COLLECTION, entity.id()))?;
    tracing::info!("{} {} in {}", action, entity.id(), E::COLLECTION);
    Ok(())
}

/// Point lookup
pub async fn load<E: Entity>(db: &Database, id: &str) -> Result<Option<E>> {
    db.get(E::COLLECTION, id)
        .await?
        .map(|doc| E::from_document(&doc))
        .transpose()
}

/// Point lookup that must succeed
pub async fn require<E: Entity>(db: &Database, id: &str) -> Result<E> {
    load(db, id).await?.ok_or_else(|| Error::NotFound {
        collection: E::COLLECTION.to_string(),
        id: id.to_string(),
    })
}

/// Every entity matching a filter, ordered by id
pub async fn find<E: Entity>(db: &Database, filter: &Filter) -> Result<Vec<E>> {
    db.find(E::COLLECTION, filter)
        .await?
        .iter()
        .map(E::from_document)
        .collect()
}
