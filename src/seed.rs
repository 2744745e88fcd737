//! Deterministic sample data
//!
//! Loads a small connected dataset through the repositories, so every
//! reference and schema check applies: 10 instructors, 10 students,
//! 8 courses (one unpublished, all located), 15 enrollments, up to 25
//! lessons, 10 assignments and 12 submissions. Dates are relative to now.
//!
//! Expects empty collections; run after `Database::apply_validators`.

use crate::entities::{new_id, Enrollment, EnrollmentStatus, Level};
use crate::error::Result;
use crate::repo::{assignments, courses, enrollments, lessons, submissions, users};
use crate::Database;
use chrono::{Duration, Utc};
use serde::Serialize;

const INSTRUCTOR_FIRST: [&str; 5] = ["Alice", "Bob", "Charlie", "Diana", "Eve"];
const INSTRUCTOR_LAST: [&str; 5] = ["Smith", "Jones", "Williams", "Brown", "Davis"];
const STUDENT_FIRST: [&str; 10] = [
    "Frank", "Grace", "Heidi", "Ivan", "Judy", "Karl", "Linda", "Mike", "Nancy", "Oscar",
];
const STUDENT_LAST: [&str; 10] = [
    "Wilson", "Miller", "Taylor", "Anderson", "Thomas", "Jackson", "White", "Harris", "Martin", "Thompson",
];
const INSTRUCTOR_SKILLS: [&str; 8] = [
    "Python", "Java", "C++", "JavaScript", "MongoDB", "SQL", "Machine Learning", "Cloud Computing",
];
const STUDENT_SKILLS: [&str; 4] = ["Beginner", "Intermediate", "Fast Learner", "Problem Solver"];

const CATEGORIES: [&str; 8] = [
    "Programming", "Web Development", "Data Science", "Design", "Business", "Marketing", "Science", "Arts",
];
const TITLE_PREFIXES: [&str; 4] = ["Mastering", "Introduction to", "Advanced", "Fundamentals of"];
const TAGS: [&str; 6] = [
    "Online", "Certification", "Project-based", "Interactive", "Self-paced", "Beginner Friendly",
];
const PRICES: [f64; 8] = [49.99, 89.5, 129.0, 29.99, 199.99, 74.25, 159.0, 299.99];

/// (name, longitude, latitude)
const CITIES: [(&str, f64, f64); 8] = [
    ("London", -0.1278, 51.5074),
    ("Paris", 2.3522, 48.8566),
    ("Berlin", 13.4050, 52.5200),
    ("Madrid", -3.7038, 40.4168),
    ("New York", -74.0060, 40.7128),
    ("Toronto", -79.3832, 43.6532),
    ("Cairo", 31.2357, 30.0444),
    ("Tokyo", 139.6503, 35.6762),
];

const LESSON_TOPICS: [&str; 4] = ["Introduction", "Core Concepts", "Advanced Topics", "Practice Session"];
const LESSON_FOCUS: [&str; 4] = ["algorithms", "frontend", "data analysis", "user experience"];
const MAX_LESSONS: usize = 25;
const ASSIGNMENT_KINDS: [&str; 4] = ["Quiz", "Project", "Essay", "Coding Challenge"];
const FEEDBACK: [&str; 4] = [
    "Excellent work!",
    "Good attempt, review chapter 3.",
    "Well done, minor improvements needed.",
    "Needs more detail.",
];

/// Number of records created per collection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeedSummary {
    pub users: usize,
    pub courses: usize,
    pub enrollments: usize,
    pub lessons: usize,
    pub assignments: usize,
    pub submissions: usize,
}

fn pick<'a, T>(items: &'a [T], i: usize) -> &'a T {
    &items[i % items.len()]
}

fn rotate(items: &[&str], start: usize, count: usize) -> Vec<String> {
    (0..count).map(|k| pick(items, start + k).to_string()).collect()
}

pub async fn seed(db: &Database) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();
    let now = Utc::now();

    let mut instructors = Vec::new();
    let mut students = Vec::new();
    for i in 0..20 {
        let user = if i % 2 == 0 {
            let (first, last) = (*pick(&STUDENT_FIRST, i / 2), *pick(&STUDENT_LAST, i * 3 / 2));
            let new = users::NewUser::new(
                format!("{}_{}{}", first.to_lowercase(), last.to_lowercase(), i),
                format!("{}.{}{}@example.com", first.to_lowercase(), last.to_lowercase(), i),
                format!("hashed_password_{:04}", i),
            )
            .named(first, last)
            .bio(format!("Eager to learn about {}.", pick(&["programming", "design", "history", "science"], i)))
            .skills(rotate(&STUDENT_SKILLS, i, 1 + i % 2));
            let student = users::add_student(db, new).await?;
            students.push(student.id.clone());
            student
        } else {
            let (first, last) = (*pick(&INSTRUCTOR_FIRST, i / 2), *pick(&INSTRUCTOR_LAST, i / 3));
            let new = users::NewUser::new(
                format!("{}_{}{}", first.to_lowercase(), last.to_lowercase(), i),
                format!("{}.{}{}@example.com", first.to_lowercase(), last.to_lowercase(), i),
                format!("hashed_password_{:04}", i),
            )
            .named(first, last)
            .bio(format!("Experienced instructor in {}.", pick(&["AI", "Web Dev", "Data Science", "Networking"], i)))
            .skills(rotate(&INSTRUCTOR_SKILLS, i, 2 + i % 3));
            let instructor = users::add_instructor(db, new).await?;
            instructors.push(instructor.id.clone());
            instructor
        };
        summary.users += 1;
        // A few inactive accounts
        if i % 7 == 6 {
            users::soft_delete(db, &user.id).await?;
        }
    }

    let levels = [Level::Beginner, Level::Intermediate, Level::Advanced];
    let mut course_ids = Vec::new();
    for i in 0..CATEGORIES.len() {
        let category = CATEGORIES[i];
        let level = levels[i % levels.len()];
        let new = courses::NewCourse::new(
            format!("{} {} Course {}", pick(&TITLE_PREFIXES, i), category, i + 1),
            format!(
                "A comprehensive course covering {} concepts and practices. This course is for {} learners.",
                category.to_lowercase(),
                level
            ),
            pick(&instructors, i * 3).as_str(),
        )
        .category(category)
        .level(level)
        .duration((20 + i * 10) as f64)
        .price(PRICES[i])
        .tags(rotate(&TAGS, i, 2 + i % 3));
        let course = courses::create(db, new).await?;

        let (_, lon, lat) = CITIES[i];
        courses::set_location(db, &course.id, lon, lat).await?;
        if i == CATEGORIES.len() - 1 {
            courses::set_published(db, &course.id, false).await?;
        }
        course_ids.push(course.id);
        summary.courses += 1;
    }

    for i in 0..15 {
        let enrollment = Enrollment {
            id: new_id(),
            student_id: pick(&students, i).clone(),
            course_id: pick(&course_ids, i * 3).clone(),
            enrollment_date: now - Duration::days(10 + (i as i64 * 13) % 81),
            status: *pick(EnrollmentStatus::ALL, i),
        };
        if enrollments::enroll_record(db, enrollment).await?.is_new() {
            summary.enrollments += 1;
        }
    }

    let mut lesson_ids = Vec::new();
    'courses: for (c, course_id) in course_ids.iter().enumerate() {
        for n in 1..=(3 + c % 3) {
            if lesson_ids.len() >= MAX_LESSONS {
                break 'courses;
            }
            let lesson = lessons::add(
                db,
                course_id,
                &format!("Lesson {}: {}", n, pick(&LESSON_TOPICS, c + n)),
                &format!(
                    "Detailed content for lesson {} covering specific topics within the course. \
                     This lesson aims to deepen understanding of {}.",
                    n,
                    pick(&LESSON_FOCUS, c * n)
                ),
            )
            .await?;
            lesson_ids.push(lesson.id);
        }
    }
    summary.lessons = lesson_ids.len();

    let mut assignment_ids = Vec::new();
    for i in 0..10 {
        let assignment = assignments::create(
            db,
            assignments::NewAssignment {
                lesson_id: pick(&lesson_ids, i * 2).clone(),
                title: format!("Assignment {}: {}", i + 1, pick(&ASSIGNMENT_KINDS, i)),
                description: "Complete this task to demonstrate your understanding of the lesson.".to_string(),
                due_date: now + Duration::days(3 + i as i64 * 2),
                max_score: Some(100.0),
            },
        )
        .await?;
        assignment_ids.push(assignment.id);
    }
    summary.assignments = assignment_ids.len();

    for i in 0..12 {
        let graded = i % 3 != 2;
        let assignment_id = pick(&assignment_ids, i).clone();
        let student_id = pick(&students, i * 3).clone();
        submissions::submit(
            db,
            submissions::NewSubmission {
                content: format!(
                    "Submission content for assignment {} by student {}.",
                    &assignment_id[..8],
                    &student_id[..8]
                ),
                assignment_id,
                student_id,
                grade: graded.then(|| 50.0 + ((i * 17) % 50) as f64 + 0.5),
                feedback: graded.then(|| pick(&FEEDBACK, i).to_string()),
            },
        )
        .await?;
        summary.submissions += 1;
    }

    tracing::info!("Seeded sample data: {:?}", summary);
    Ok(summary)
}
