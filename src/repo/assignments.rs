//! Assignments

use super::{find, insert};
use crate::entities::{new_id, Assignment};
use crate::error::{Error, Result};
use crate::query::filter::Filter;
use crate::Database;
use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub lesson_id: String,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub max_score: Option<f64>,
}

/// Create an assignment for an existing lesson
pub async fn create(db: &Database, new: NewAssignment) -> Result<Assignment> {
    let now = Utc::now();
    let assignment = Assignment {
        id: new_id(),
        lesson_id: new.lesson_id,
        title: new.title,
        description: new.description,
        due_date: new.due_date,
        max_score: new.max_score,
        created_at: Some(now),
        updated_at: Some(now),
    };

    insert(db, &assignment).await?;
    Ok(assignment)
}

pub async fn get(db: &Database, id: &str) -> Result<Option<Assignment>> {
    super::load(db, id).await
}

/// Assignments due within `[from, to]`, earliest first
pub async fn due_between(db: &Database, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<Assignment>> {
    if from > to {
        return Err(Error::InvalidArgument {
            message: format!("date range starts after it ends: {} > {}", from, to),
        });
    }
    let mut due: Vec<Assignment> = find(db, &Filter::between("due_date", from, to)).await?;
    due.sort_by_key(|a| a.due_date);
    Ok(due)
}

/// Assignments due in the coming 7 days
pub async fn due_next_week(db: &Database) -> Result<Vec<Assignment>> {
    let now = Utc::now();
    due_between(db, now, now + Duration::days(7)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::{courses, lessons, users};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_due_windows() {
        let tmp = TempDir::new().unwrap();
        let mut db = Database::open(tmp.path()).await.unwrap();
        db.apply_validators().await.unwrap();

        let tutor = users::add_instructor(&db, users::NewUser::new("teach", "t@example.com", "h"))
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

        let new = |days: i64| NewAssignment {
            lesson_id: lesson.id.clone(),
            title: format!("Assignment due in {}", days),
            description: "Write a borrow checker friendly linked list.".into(),
            due_date: Utc::now() + Duration::days(days),
            max_score: Some(100.0),
        };

        create(&db, new(3)).await.unwrap();
        create(&db, new(1)).await.unwrap();
        create(&db, new(20)).await.unwrap();

        let soon = due_next_week(&db).await.unwrap();
        assert_eq!(soon.len(), 2);
        assert!(soon[0].due_date < soon[1].due_date);

        let all = due_between(&db, Utc::now(), Utc::now() + Duration::days(30)).await.unwrap();
        assert_eq!(all.len(), 3);

        let orphan = NewAssignment {
            lesson_id: "ghost".into(),
            ..new(2)
        };
        assert!(create(&db, orphan).await.unwrap_err().is_not_found());
        assert!(due_between(&db, Utc::now(), Utc::now() - Duration::days(1)).await.is_err());
    }
}
