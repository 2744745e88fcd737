//! Integration tests for EduHub
//!
//! End-to-end flows through the public API, checked against the files and
//! commits they leave behind.

use chrono::{Duration, Utc};
use eduhub::entities::{new_id, Enrollment, EnrollmentStatus};
use eduhub::features::{archive, search};
use eduhub::repo::{assignments, courses, enrollments, lessons, submissions, users};
use eduhub::schema::catalog::{COURSES, ENROLLMENTS, USERS};
use eduhub::{export, reports, seed, Database, Filter};
use tempfile::TempDir;

/// Helper to create a database with validators installed
async fn setup_test_db() -> (TempDir, Database) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let mut db = Database::open(tmp.path()).await.expect("Failed to open database");
    db.apply_validators().await.expect("Failed to apply validators");
    (tmp, db)
}

async fn instructor(db: &Database, username: &str) -> String {
    users::add_instructor(
        db,
        users::NewUser::new(username, format!("{}@example.com", username), "hashed"),
    )
    .await
    .expect("Failed to add instructor")
    .id
}

async fn student(db: &Database, username: &str) -> String {
    users::add_student(
        db,
        users::NewUser::new(username, format!("{}@example.com", username), "hashed"),
    )
    .await
    .expect("Failed to add student")
    .id
}

async fn course(db: &Database, title: &str, description: &str, instructor_id: &str) -> String {
    courses::create(db, courses::NewCourse::new(title, description, instructor_id))
        .await
        .expect("Failed to create course")
        .id
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn test_user_document_on_disk() {
    let (tmp, db) = setup_test_db().await;
    let id = student(&db, "ada").await;

    let path = tmp.path().join("collections/users").join(format!("{}.md", id));
    let content = std::fs::read_to_string(path).unwrap();
    assert!(content.starts_with("---"));
    assert!(content.contains("ada@example.com"));
    assert!(content.contains("role: student"));
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let (_tmp, db) = setup_test_db().await;
    student(&db, "ada").await;

    let err = users::add_instructor(&db, users::NewUser::new("ada2", "ada@example.com", "h"))
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(db.collection(USERS).unwrap().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_invalid_email_is_rejected() {
    let (_tmp, db) = setup_test_db().await;
    let err = users::add_student(&db, users::NewUser::new("ada", "not-an-email", "h"))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(db.collection(USERS).unwrap().count().await.unwrap(), 0);
}

// =============================================================================
// Courses and enrollments
// =============================================================================

#[tokio::test]
async fn test_course_with_missing_instructor_not_persisted() {
    let (_tmp, db) = setup_test_db().await;

    let err = courses::create(
        &db,
        courses::NewCourse::new("Orphan Course", "Nobody teaches this one.", "ghost"),
    )
    .await
    .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(db.collection(COURSES).unwrap().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_ids_cannot_reach_other_collections() {
    let (_tmp, db) = setup_test_db().await;
    let tutor = instructor(&db, "alice").await;
    let learner = student(&db, "frank").await;
    let existing = course(&db, "Rust in Practice", "Ownership, traits and async.", &tutor).await;

    let err = courses::create(
        &db,
        courses::NewCourse::new(
            "Sideways Course",
            "Taught by another course.",
            format!("../{}/{}", COURSES, existing),
        ),
    )
    .await
    .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(db.collection(COURSES).unwrap().count().await.unwrap(), 1);

    let err = enrollments::delete(&db, &format!("../{}/{}", USERS, learner))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(users::get(&db, &learner).await.unwrap().is_some());
}

#[tokio::test]
async fn test_enroll_twice_is_noop() {
    let (_tmp, db) = setup_test_db().await;
    let tutor = instructor(&db, "alice").await;
    let learner = student(&db, "frank").await;
    let course_id = course(&db, "Rust in Practice", "Ownership, traits and async.", &tutor).await;

    let first = enrollments::enroll(&db, &learner, &course_id).await.unwrap();
    assert!(first.is_new());
    let commits = db.git.commit_count().unwrap();

    let second = enrollments::enroll(&db, &learner, &course_id).await.unwrap();
    assert!(!second.is_new());
    assert_eq!(second.enrollment().id, first.enrollment().id);
    assert_eq!(db.collection(ENROLLMENTS).unwrap().count().await.unwrap(), 1);
    assert_eq!(db.git.commit_count().unwrap(), commits);
}

#[tokio::test]
async fn test_students_in_course_by_title() {
    let (_tmp, db) = setup_test_db().await;
    let tutor = instructor(&db, "alice").await;
    let course_id = course(&db, "Rust in Practice", "Ownership, traits and async.", &tutor).await;
    for name in ["frank", "grace"] {
        let id = student(&db, name).await;
        enrollments::enroll(&db, &id, &course_id).await.unwrap();
    }

    let roster = enrollments::students_in_course(&db, "Rust in Practice").await.unwrap();
    assert_eq!(roster.len(), 2);
    assert!(enrollments::students_in_course(&db, "No Such Course")
        .await
        .unwrap()
        .is_empty());
}

// =============================================================================
// Lessons, assignments, submissions
// =============================================================================

#[tokio::test]
async fn test_lesson_removal_keeps_order_dense() {
    let (_tmp, db) = setup_test_db().await;
    let tutor = instructor(&db, "alice").await;
    let course_id = course(&db, "Rust in Practice", "Ownership, traits and async.", &tutor).await;

    let mut ids = Vec::new();
    for n in 1..=4 {
        let lesson = lessons::add(
            &db,
            &course_id,
            &format!("Lesson {}", n),
            "Content long enough to satisfy the validator.",
        )
        .await
        .unwrap();
        assert_eq!(lesson.order, n);
        ids.push(lesson.id);
    }

    let renumbered = lessons::remove(&db, &ids[1]).await.unwrap();
    assert_eq!(renumbered, 2);

    let remaining = lessons::list_for_course(&db, &course_id).await.unwrap();
    let orders: Vec<i64> = remaining.iter().map(|l| l.order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    assert_eq!(remaining[1].id, ids[2]);

    let next = lessons::add(&db, &course_id, "Lesson 5", "Content long enough to satisfy the validator.")
        .await
        .unwrap();
    assert_eq!(next.order, 4);
}

#[tokio::test]
async fn test_out_of_range_grade_keeps_stored_grade() {
    let (_tmp, db) = setup_test_db().await;
    let tutor = instructor(&db, "alice").await;
    let learner = student(&db, "frank").await;
    let course_id = course(&db, "Rust in Practice", "Ownership, traits and async.", &tutor).await;
    let lesson = lessons::add(&db, &course_id, "Lesson 1", "Content long enough to satisfy the validator.")
        .await
        .unwrap();
    let assignment = assignments::create(
        &db,
        assignments::NewAssignment {
            lesson_id: lesson.id,
            title: "Borrow checker quiz".to_string(),
            description: "Ten questions on lifetimes.".to_string(),
            due_date: Utc::now() + Duration::days(3),
            max_score: Some(100.0),
        },
    )
    .await
    .unwrap();
    let submission = submissions::submit(
        &db,
        submissions::NewSubmission {
            assignment_id: assignment.id,
            student_id: learner,
            content: "My answers".to_string(),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let graded = submissions::update_grade(&db, &submission.id, 88.0, Some("Nice".to_string()))
        .await
        .unwrap();
    assert_eq!(graded.grade, Some(88.0));

    let err = submissions::update_grade(&db, &submission.id, 101.0, None)
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let stored = submissions::get(&db, &submission.id).await.unwrap().unwrap();
    assert_eq!(stored.grade, Some(88.0));
    assert_eq!(stored.feedback.as_deref(), Some("Nice"));
}

#[tokio::test]
async fn test_due_between_rejects_inverted_window() {
    let (_tmp, db) = setup_test_db().await;
    let now = Utc::now();
    let err = assignments::due_between(&db, now, now - Duration::days(1))
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

// =============================================================================
// Reports and features over the sample dataset
// =============================================================================

#[tokio::test]
async fn test_seeded_reports() {
    let (_tmp, db) = setup_test_db().await;
    let summary = seed::seed(&db).await.unwrap();

    let categories = reports::courses_by_category(&db).await.unwrap();
    let total: i64 = categories.iter().map(|c| c.course_count).sum();
    assert_eq!(total as usize, summary.courses);

    let top = reports::top_students(&db, reports::DEFAULT_TOP_STUDENTS).await.unwrap();
    assert!(top.len() <= reports::DEFAULT_TOP_STUDENTS);
    assert!(top.windows(2).all(|w| w[0].average_grade >= w[1].average_grade));

    for report in reports::Report::ALL {
        report.run(&db).await.unwrap();
    }
}

#[tokio::test]
async fn test_search_ranks_matches() {
    let (_tmp, db) = setup_test_db().await;
    let tutor = instructor(&db, "alice").await;
    course(&db, "Python for Data", "Python python pandas and python notebooks.", &tutor).await;
    course(&db, "Web Basics", "HTML and CSS with a little python scripting.", &tutor).await;
    course(&db, "Watercolour Painting", "Brushes, paper and colour mixing.", &tutor).await;

    let hits = search::search_courses(&db, "python").await.unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "Python for Data");
    assert!(hits[0].score > hits[1].score);

    assert!(search::search_courses(&db, "   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_archive_leaves_old_enrollments_only_in_archive() {
    let (_tmp, db) = setup_test_db().await;
    let tutor = instructor(&db, "alice").await;
    let learner = student(&db, "frank").await;
    let archive_name = db.config.archive_collection.clone();

    for (title, age) in [("Old Course One", 400), ("New Course Two", 5)] {
        let course_id = course(&db, title, "A description long enough.", &tutor).await;
        enrollments::enroll_record(
            &db,
            Enrollment {
                id: new_id(),
                student_id: learner.clone(),
                course_id,
                enrollment_date: Utc::now() - Duration::days(age),
                status: EnrollmentStatus::Completed,
            },
        )
        .await
        .unwrap();
    }

    let report = archive::archive_older_than_days(&db, 365).await.unwrap();
    assert_eq!(report.archived, 1);
    assert_eq!(report.deleted, 1);

    let cutoff = Utc::now() - Duration::days(365);
    let live_old = db
        .find(ENROLLMENTS, &Filter::lt("enrollment_date", cutoff))
        .await
        .unwrap();
    assert!(live_old.is_empty());
    assert_eq!(db.collection(ENROLLMENTS).unwrap().count().await.unwrap(), 1);
    assert_eq!(db.collection(&archive_name).unwrap().count().await.unwrap(), 1);
    assert!(db.git.head_message().unwrap().starts_with("Archive enrollments"));
}

#[tokio::test]
async fn test_export_import_round_trip() {
    let (_src_tmp, src) = setup_test_db().await;
    seed::seed(&src).await.unwrap();
    let (dump, exported) = export::export_json(&src).await.unwrap();

    let (_dst_tmp, dst) = setup_test_db().await;
    let imported = export::import_json(&dst, &dump).await.unwrap();
    assert_eq!(imported, exported);

    assert_eq!(
        reports::enrollments_per_course(&src).await.unwrap(),
        reports::enrollments_per_course(&dst).await.unwrap()
    );
    assert_eq!(
        reports::average_grade_per_student(&src).await.unwrap(),
        reports::average_grade_per_student(&dst).await.unwrap()
    );
}
