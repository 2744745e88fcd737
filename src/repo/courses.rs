//! Courses

use super::{find, insert, require, save};
use crate::entities::{add_to_set, new_id, Course, Level};
use crate::error::Result;
use crate::features::geo::GeoPoint;
use crate::query::filter::Filter;
use crate::query::pipeline::{Expr, Pipeline};
use crate::schema::catalog::{COURSES, USERS};
use crate::Database;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Fields supplied when creating a course
#[derive(Debug, Clone, Default)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub instructor_id: String,
    pub category: Option<String>,
    pub level: Option<Level>,
    pub duration: Option<f64>,
    pub price: Option<f64>,
    pub tags: Vec<String>,
}

impl NewCourse {
    pub fn new(title: impl Into<String>, description: impl Into<String>, instructor_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            instructor_id: instructor_id.into(),
            ..Default::default()
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn duration(mut self, hours: f64) -> Self {
        self.duration = Some(hours);
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Create a published course.
///
/// The instructor must exist, otherwise `NotFound` and nothing is written.
pub async fn create(db: &Database, new: NewCourse) -> Result<Course> {
    let now = Utc::now();
    let course = Course {
        id: new_id(),
        title: new.title,
        description: new.description,
        instructor_id: new.instructor_id,
        category: new.category,
        level: new.level,
        duration: new.duration,
        price: new.price,
        tags: new.tags,
        is_published: true,
        location: None,
        created_at: now,
        updated_at: now,
    };

    insert(db, &course).await?;
    Ok(course)
}

pub async fn get(db: &Database, id: &str) -> Result<Option<Course>> {
    super::load(db, id).await
}

pub async fn by_category(db: &Database, category: &str) -> Result<Vec<Course>> {
    find(db, &Filter::eq("category", category)).await
}

/// Courses priced within `[min, max]`
pub async fn by_price_range(db: &Database, min: f64, max: f64) -> Result<Vec<Course>> {
    find(db, &Filter::between("price", min, max)).await
}

/// Courses carrying at least one of `tags`
pub async fn with_any_tags(db: &Database, tags: &[&str]) -> Result<Vec<Course>> {
    find(db, &Filter::any_of("tags", tags.iter().copied())).await
}

/// Case-insensitive title substring search; `term` is matched literally
pub async fn search_title(db: &Database, term: &str) -> Result<Vec<Course>> {
    find(db, &Filter::contains_ci("title", term)?).await
}

/// Exact title lookup, ignoring case
pub async fn find_by_title(db: &Database, title: &str) -> Result<Option<Course>> {
    Ok(find(db, &Filter::equals_ci("title", title)?).await?.into_iter().next())
}

/// A course joined with its instructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDetails {
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub level: Option<String>,
    pub price: Option<f64>,
    pub instructor_name: Option<String>,
    pub instructor_email: Option<String>,
}

/// Courses with instructor name and email, optionally narrowed by a
/// literal title substring. Courses whose instructor is gone are left out.
pub async fn details_with_instructor(db: &Database, title_substring: Option<&str>) -> Result<Vec<CourseDetails>> {
    let filter = match title_substring {
        Some(term) => Filter::contains_ci("title", term)?,
        None => Filter::All,
    };

    Pipeline::over(COURSES)
        .filter(filter)
        .join(USERS, "instructor_id", "_id", "instructor")
        .project(vec![
            ("course_id", Expr::field("_id")),
            ("title", Expr::field("title")),
            ("description", Expr::field("description")),
            ("category", Expr::field("category")),
            ("level", Expr::field("level")),
            ("price", Expr::field("price")),
            ("instructor_name", Expr::full_name("instructor")),
            ("instructor_email", Expr::field("instructor.email")),
        ])
        .run_as(db)
        .await
}

pub async fn set_published(db: &Database, id: &str, published: bool) -> Result<Course> {
    let mut course: Course = require(db, id).await?;
    course.is_published = published;
    course.updated_at = Utc::now();
    save(db, &course, if published { "Publish" } else { "Unpublish" }).await?;
    Ok(course)
}

/// Add tags, skipping ones the course already has
pub async fn add_tags<S: Into<String>>(db: &Database, id: &str, tags: impl IntoIterator<Item = S>) -> Result<Course> {
    let mut course: Course = require(db, id).await?;
    add_to_set(&mut course.tags, tags.into_iter().map(Into::into));
    course.updated_at = Utc::now();
    save(db, &course, "Tag").await?;
    Ok(course)
}

pub async fn set_location(db: &Database, id: &str, longitude: f64, latitude: f64) -> Result<Course> {
    let location = GeoPoint::checked(longitude, latitude)?;
    let mut course: Course = require(db, id).await?;
    course.location = Some(location);
    course.updated_at = Utc::now();
    save(db, &course, "Locate").await?;
    Ok(course)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::users::{self, NewUser};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, Database, String) {
        let tmp = TempDir::new().unwrap();
        let mut db = Database::open(tmp.path()).await.unwrap();
        db.apply_validators().await.unwrap();
        let instructor = users::add_instructor(
            &db,
            NewUser::new("alice", "alice@example.com", "h").named("Alice", "Smith"),
        )
        .await
        .unwrap();
        (tmp, db, instructor.id)
    }

    fn python(instructor: &str) -> NewCourse {
        NewCourse::new(
            "Introduction to Python Programming",
            "Variables, loops, functions and modules.",
            instructor,
        )
        .category("Programming")
        .level(Level::Beginner)
        .price(49.99)
        .tags(["Online", "Certification"])
    }

    #[tokio::test]
    async fn test_create_requires_instructor() {
        let (_tmp, db, _) = setup().await;
        let err = create(&db, python("missing-instructor")).await.unwrap_err();
        assert!(err.is_not_found());
        assert!(find::<Course>(&db, &Filter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads() {
        let (_tmp, db, instructor) = setup().await;
        let course = create(&db, python(&instructor)).await.unwrap();
        assert!(course.is_published);
        create(
            &db,
            NewCourse::new("Web Design (Advanced)", "Layouts, grids and type.", &instructor)
                .category("Design")
                .price(120.0)
                .tags(["Project-based"]),
        )
        .await
        .unwrap();

        assert_eq!(by_category(&db, "Programming").await.unwrap().len(), 1);
        assert_eq!(by_price_range(&db, 10.0, 50.0).await.unwrap().len(), 1);
        assert_eq!(by_price_range(&db, 49.99, 120.0).await.unwrap().len(), 2);
        assert_eq!(with_any_tags(&db, &["Online", "Project-based"]).await.unwrap().len(), 2);
        assert_eq!(search_title(&db, "PYTHON").await.unwrap().len(), 1);
        // Regex metacharacters are literal
        assert_eq!(search_title(&db, "(Advanced)").await.unwrap().len(), 1);
        assert_eq!(search_title(&db, "Py.hon").await.unwrap().len(), 0);

        let found = find_by_title(&db, "introduction to python programming").await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(course.id));
        assert!(find_by_title(&db, "introduction").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_details_with_instructor() {
        let (_tmp, db, instructor) = setup().await;
        create(&db, python(&instructor)).await.unwrap();

        let details = details_with_instructor(&db, Some("python")).await.unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].instructor_name.as_deref(), Some("Alice Smith"));
        assert_eq!(details[0].instructor_email.as_deref(), Some("alice@example.com"));

        assert!(details_with_instructor(&db, Some("rust")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_updates() {
        let (_tmp, db, instructor) = setup().await;
        let course = create(&db, python(&instructor)).await.unwrap();

        let course2 = add_tags(&db, &course.id, ["AI", "Online"]).await.unwrap();
        assert_eq!(course2.tags, vec!["Online", "Certification", "AI"]);

        let course3 = set_published(&db, &course.id, false).await.unwrap();
        assert!(!course3.is_published);

        let located = set_location(&db, &course.id, -0.1278, 51.5074).await.unwrap();
        assert_eq!(get(&db, &course.id).await.unwrap().unwrap().location, located.location);
        assert!(set_location(&db, &course.id, 0.0, 123.0).await.unwrap_err().is_validation());

        assert!(set_published(&db, "nope", true).await.unwrap_err().is_not_found());
    }
}
