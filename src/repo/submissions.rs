//! Submissions and grading

use super::{find, insert, require, save};
use crate::entities::{new_id, Submission};
use crate::error::{Error, Result};
use crate::query::filter::Filter;
use crate::schema::catalog::SUBMISSIONS;
use crate::Database;
use chrono::Utc;

pub const MIN_GRADE: f64 = 0.0;
pub const MAX_GRADE: f64 = 100.0;

#[derive(Debug, Clone, Default)]
pub struct NewSubmission {
    pub assignment_id: String,
    pub student_id: String,
    pub content: String,
    pub grade: Option<f64>,
    pub feedback: Option<String>,
}

fn check_grade(grade: f64) -> Result<()> {
    if (MIN_GRADE..=MAX_GRADE).contains(&grade) {
        Ok(())
    } else {
        Err(Error::Validation {
            collection: SUBMISSIONS.to_string(),
            message: format!("grade {} is outside {}..={}", grade, MIN_GRADE, MAX_GRADE),
        })
    }
}

/// Record a submission; ungraded unless a valid grade is supplied
pub async fn submit(db: &Database, new: NewSubmission) -> Result<Submission> {
    if let Some(grade) = new.grade {
        check_grade(grade)?;
    }

    let now = Utc::now();
    let submission = Submission {
        id: new_id(),
        assignment_id: new.assignment_id,
        student_id: new.student_id,
        submission_date: now,
        content: new.content,
        grade: new.grade,
        feedback: new.feedback,
        created_at: Some(now),
        updated_at: Some(now),
    };

    insert(db, &submission).await?;
    Ok(submission)
}

pub async fn get(db: &Database, id: &str) -> Result<Option<Submission>> {
    super::load(db, id).await
}

pub async fn for_student(db: &Database, student_id: &str) -> Result<Vec<Submission>> {
    find(db, &Filter::eq("student_id", student_id)).await
}

/// Grade a submission.
///
/// A grade outside 0..=100 is a validation error and nothing is written.
/// Feedback is replaced only when given.
pub async fn update_grade(db: &Database, id: &str, grade: f64, feedback: Option<String>) -> Result<Submission> {
    check_grade(grade)?;

    let mut submission: Submission = require(db, id).await?;
    submission.grade = Some(grade);
    if let Some(feedback) = feedback {
        submission.feedback = Some(feedback);
    }
    submission.updated_at = Some(Utc::now());

    save(db, &submission, "Grade").await?;
    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{assignments, courses, lessons, users};
    use chrono::Duration;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Database, String, String) {
        let tmp = TempDir::new().unwrap();
        let mut db = Database::open(tmp.path()).await.unwrap();
        db.apply_validators().await.unwrap();

        let tutor = users::add_instructor(&db, users::NewUser::new("teach", "t@example.com", "h"))
            .await
            .unwrap();
        let student = users::add_student(&db, users::NewUser::new("stud", "s@example.com", "h"))
            .await
            .unwrap();
        let course = courses::create(
            &db,
            courses::NewCourse::new("Rust in Practice", "Ownership, traits and async.", &tutor.id),
        )
        .await
        .unwrap();
        let lesson = lessons::add(&db, &course.id, "Lesson 1: Ownership", "Moves, borrows and lifetimes in depth.")
            .await
            .unwrap();
        let assignment = assignments::create(
            &db,
            assignments::NewAssignment {
                lesson_id: lesson.id,
                title: "Quiz 1: Borrowing".into(),
                description: "Ten questions on the borrow checker.".into(),
                due_date: Utc::now() + Duration::days(7),
                max_score: Some(100.0),
            },
        )
        .await
        .unwrap();
        (tmp, db, assignment.id, student.id)
    }

    #[tokio::test]
    async fn test_grade_out_of_range_is_rejected() {
        let (_tmp, db, assignment, student) = setup().await;
        let sub = submit(
            &db,
            NewSubmission {
                assignment_id: assignment,
                student_id: student,
                content: "answers".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(sub.grade, None);

        let graded = update_grade(&db, &sub.id, 88.5, Some("Good".into())).await.unwrap();
        assert_eq!(graded.grade, Some(88.5));

        let err = update_grade(&db, &sub.id, 101.0, None).await.unwrap_err();
        assert!(err.is_validation());
        assert!(update_grade(&db, &sub.id, -1.0, None).await.is_err());
        assert!(update_grade(&db, &sub.id, f64::NAN, None).await.is_err());

        let stored = get(&db, &sub.id).await.unwrap().unwrap();
        assert_eq!(stored.grade, Some(88.5));
        assert_eq!(stored.feedback.as_deref(), Some("Good"));

        assert!(update_grade(&db, "ghost", 50.0, None).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_submit_checks_references_and_grade() {
        let (_tmp, db, assignment, student) = setup().await;

        let orphan = NewSubmission {
            assignment_id: "ghost".into(),
            student_id: student.clone(),
            content: "answers".into(),
            ..Default::default()
        };
        assert!(submit(&db, orphan).await.unwrap_err().is_not_found());

        let bad = NewSubmission {
            assignment_id: assignment,
            student_id: student.clone(),
            content: "answers".into(),
            grade: Some(150.0),
            ..Default::default()
        };
        assert!(submit(&db, bad).await.unwrap_err().is_validation());
        assert!(for_student(&db, &student).await.unwrap().is_empty());
    }
}
