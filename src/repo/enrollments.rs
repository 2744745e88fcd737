//! Enrollments of students in courses

use super::{find, insert, require, save};
use crate::entities::{new_id, Enrollment, EnrollmentStatus};
use crate::error::{Error, Result};
use crate::query::filter::Filter;
use crate::query::pipeline::{Expr, Pipeline};
use crate::schema::catalog::{ENROLLMENTS, USERS};
use crate::Database;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of an enroll call
#[derive(Debug, Clone, PartialEq)]
pub enum EnrollOutcome {
    /// A new enrollment was written
    Enrolled(Enrollment),
    /// The student already had an enrollment in this course; nothing written
    AlreadyEnrolled(Enrollment),
}

impl EnrollOutcome {
    pub fn enrollment(&self) -> &Enrollment {
        match self {
            EnrollOutcome::Enrolled(e) | EnrollOutcome::AlreadyEnrolled(e) => e,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, EnrollOutcome::Enrolled(_))
    }
}

/// Enroll a student in a course as `active`.
///
/// Both must exist. A second enrollment of the same pair is a no-op that
/// hands back the existing record.
pub async fn enroll(db: &Database, student_id: &str, course_id: &str) -> Result<EnrollOutcome> {
    let enrollment = Enrollment {
        id: new_id(),
        student_id: student_id.to_string(),
        course_id: course_id.to_string(),
        enrollment_date: Utc::now(),
        status: EnrollmentStatus::Active,
    };
    enroll_record(db, enrollment).await
}

/// Enroll with a caller-chosen date and status, used when loading history
pub async fn enroll_record(db: &Database, enrollment: Enrollment) -> Result<EnrollOutcome> {
    super::ensure_references(db, &enrollment).await?;

    let same_pair = Filter::eq("student_id", enrollment.student_id.as_str())
        .and(Filter::eq("course_id", enrollment.course_id.as_str()));
    if let Some(existing) = find::<Enrollment>(db, &same_pair).await?.into_iter().next() {
        tracing::info!(
            "Student {} is already enrolled in course {}",
            enrollment.student_id,
            enrollment.course_id
        );
        return Ok(EnrollOutcome::AlreadyEnrolled(existing));
    }

    insert(db, &enrollment).await?;
    Ok(EnrollOutcome::Enrolled(enrollment))
}

pub async fn get(db: &Database, id: &str) -> Result<Option<Enrollment>> {
    super::load(db, id).await
}

pub async fn for_course(db: &Database, course_id: &str) -> Result<Vec<Enrollment>> {
    find(db, &Filter::eq("course_id", course_id)).await
}

/// Move an enrollment to any state; there is no transition graph
pub async fn set_status(db: &Database, id: &str, status: EnrollmentStatus) -> Result<Enrollment> {
    let mut enrollment: Enrollment = require(db, id).await?;
    enrollment.status = status;
    save(db, &enrollment, "Set status of").await?;
    Ok(enrollment)
}

/// Hard delete
pub async fn delete(db: &Database, id: &str) -> Result<()> {
    if !db.delete(ENROLLMENTS, id).await? {
        return Err(Error::NotFound {
            collection: ENROLLMENTS.to_string(),
            id: id.to_string(),
        });
    }
    db.commit(&format!("Delete from {}: {}", ENROLLMENTS, id))?;
    tracing::info!("Deleted enrollment {}", id);
    Ok(())
}

/// A student enrolled in a course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseStudent {
    pub student_id: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub enrollment_date: DateTime<Utc>,
    pub enrollment_status: String,
}

/// Students of the course whose title matches exactly, ignoring case.
/// An unknown title yields no rows.
pub async fn students_in_course(db: &Database, course_title: &str) -> Result<Vec<CourseStudent>> {
    let Some(course) = super::courses::find_by_title(db, course_title).await? else {
        tracing::info!("Course '{}' not found", course_title);
        return Ok(Vec::new());
    };

    Pipeline::over(ENROLLMENTS)
        .filter(Filter::eq("course_id", course.id.as_str()))
        .join(USERS, "student_id", "_id", "student")
        .project(vec![
            ("student_id", Expr::field("student._id")),
            ("username", Expr::field("student.username")),
            ("email", Expr::field("student.email")),
            ("first_name", Expr::field("student.first_name")),
            ("last_name", Expr::field("student.last_name")),
            ("enrollment_date", Expr::field("enrollment_date")),
            ("enrollment_status", Expr::field("status")),
        ])
        .run_as(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::courses::{self, NewCourse};
    use crate::repo::users::{self, NewUser};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Database, String, String) {
        let tmp = TempDir::new().unwrap();
        let mut db = Database::open(tmp.path()).await.unwrap();
        db.apply_validators().await.unwrap();
        let tutor = users::add_instructor(&db, NewUser::new("teach", "t@example.com", "h"))
            .await
            .unwrap();
        let student = users::add_student(
            &db,
            NewUser::new("frank", "frank@example.com", "h").named("Frank", "Wilson"),
        )
        .await
        .unwrap();
        let course = courses::create(
            &db,
            NewCourse::new("Data Science 101", "Statistics and pandas basics.", &tutor.id),
        )
        .await
        .unwrap();
        (tmp, db, student.id, course.id)
    }

    #[tokio::test]
    async fn test_enroll_twice_is_noop() {
        let (_tmp, db, student, course) = setup().await;

        let first = enroll(&db, &student, &course).await.unwrap();
        assert!(first.is_new());
        assert_eq!(first.enrollment().status, EnrollmentStatus::Active);

        let second = enroll(&db, &student, &course).await.unwrap();
        assert!(!second.is_new());
        assert_eq!(second.enrollment().id, first.enrollment().id);
        assert_eq!(for_course(&db, &course).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_enroll_missing_refs() {
        let (_tmp, db, student, course) = setup().await;
        assert!(enroll(&db, "ghost", &course).await.unwrap_err().is_not_found());
        assert!(enroll(&db, &student, "ghost").await.unwrap_err().is_not_found());
        assert!(for_course(&db, &course).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_status_and_delete() {
        let (_tmp, db, student, course) = setup().await;
        let id = enroll(&db, &student, &course).await.unwrap().enrollment().id.clone();

        let done = set_status(&db, &id, EnrollmentStatus::Completed).await.unwrap();
        assert_eq!(done.status, EnrollmentStatus::Completed);
        // Any state may follow any other
        set_status(&db, &id, EnrollmentStatus::Active).await.unwrap();

        delete(&db, &id).await.unwrap();
        assert!(get(&db, &id).await.unwrap().is_none());
        assert!(delete(&db, &id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_students_in_course() {
        let (_tmp, db, student, course) = setup().await;
        enroll(&db, &student, &course).await.unwrap();

        let rows = students_in_course(&db, "data science 101").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].student_id, student);
        assert_eq!(rows[0].first_name.as_deref(), Some("Frank"));
        assert_eq!(rows[0].enrollment_status, "active");

        assert!(students_in_course(&db, "data science").await.unwrap().is_empty());
    }
}
