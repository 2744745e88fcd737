//! Read-only analytics over the entity collections
//!
//! Every report is a [`Pipeline`] that joins collections on their foreign
//! keys, groups, aggregates and sorts by its main metric. Joins are inner
//! joins, so rows pointing at deleted entities drop out. Averages and rates
//! are rounded to two decimals.

use crate::error::{Error, Result};
use crate::query::filter::Filter;
use crate::query::pipeline::{round_to, Accumulator, Expr, Pipeline, SortOrder};
use crate::schema::catalog::{ASSIGNMENTS, COURSES, ENROLLMENTS, LESSONS, SUBMISSIONS, USERS};
use crate::storage::document::Value;
use crate::Database;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TOP_STUDENTS: usize = 5;
pub const DEFAULT_RECOMMENDATIONS: usize = 3;
pub const POPULAR_CATEGORIES: usize = 5;

/// Round to two decimals
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

fn graded() -> Filter {
    Filter::ne("grade", Value::Null)
}

/// Graded submissions joined up to their course as `course`
fn graded_submissions_with_course() -> Pipeline {
    Pipeline::over(SUBMISSIONS)
        .filter(graded())
        .join(ASSIGNMENTS, "assignment_id", "_id", "assignment")
        .join(LESSONS, "assignment.lesson_id", "_id", "lesson")
        .join(COURSES, "lesson.course_id", "_id", "course")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseEnrollments {
    pub course_id: String,
    pub course_title: String,
    pub total_enrollments: i64,
}

/// Number of enrollments per course, busiest first
pub async fn enrollments_per_course(db: &Database) -> Result<Vec<CourseEnrollments>> {
    Pipeline::over(ENROLLMENTS)
        .group(Expr::field("course_id"), vec![("total_enrollments", Accumulator::Count)])
        .join(COURSES, "_id", "_id", "course")
        .project(vec![
            ("course_id", Expr::field("_id")),
            ("course_title", Expr::field("course.title")),
            ("total_enrollments", Expr::field("total_enrollments")),
        ])
        .sort(vec![("total_enrollments", SortOrder::Desc), ("course_title", SortOrder::Asc)])
        .run_as(db)
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseGrade {
    pub course_id: String,
    pub course_title: String,
    pub average_grade: f64,
    pub graded_submissions: i64,
}

/// Mean grade of each course's graded submissions
pub async fn average_grade_per_course(db: &Database) -> Result<Vec<CourseGrade>> {
    graded_submissions_with_course()
        .group(
            Expr::field("course._id"),
            vec![
                ("average_grade", Accumulator::Avg(Expr::field("grade"))),
                ("graded_submissions", Accumulator::Count),
            ],
        )
        .join(COURSES, "_id", "_id", "course")
        .project(vec![
            ("course_id", Expr::field("_id")),
            ("course_title", Expr::field("course.title")),
            ("average_grade", Expr::field("average_grade").round(2)),
            ("graded_submissions", Expr::field("graded_submissions")),
        ])
        .sort(vec![("average_grade", SortOrder::Desc), ("course_title", SortOrder::Asc)])
        .run_as(db)
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    /// `None` groups the uncategorised courses
    pub category: Option<String>,
    pub course_count: i64,
}

fn category_counts() -> Pipeline {
    Pipeline::over(COURSES)
        .group(Expr::field("category"), vec![("course_count", Accumulator::Count)])
        .project(vec![
            ("category", Expr::field("_id")),
            ("course_count", Expr::field("course_count")),
        ])
        .sort(vec![("course_count", SortOrder::Desc), ("category", SortOrder::Asc)])
}

/// Course count per category; the counts add up to the number of courses
pub async fn courses_by_category(db: &Database) -> Result<Vec<CategoryCount>> {
    category_counts().run_as(db).await
}

/// The five categories with the most courses
pub async fn popular_categories(db: &Database) -> Result<Vec<CategoryCount>> {
    category_counts()
        .filter(Filter::ne("category", Value::Null))
        .limit(POPULAR_CATEGORIES)
        .run_as(db)
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentGrade {
    pub student_id: String,
    pub username: String,
    pub student_name: Option<String>,
    pub average_grade: f64,
    pub graded_submissions: i64,
}

fn student_grades() -> Pipeline {
    Pipeline::over(SUBMISSIONS)
        .filter(graded())
        .group(
            Expr::field("student_id"),
            vec![
                ("average_grade", Accumulator::Avg(Expr::field("grade"))),
                ("graded_submissions", Accumulator::Count),
            ],
        )
        .join(USERS, "_id", "_id", "student")
        .project(vec![
            ("student_id", Expr::field("_id")),
            ("username", Expr::field("student.username")),
            ("student_name", Expr::full_name("student")),
            ("average_grade", Expr::field("average_grade").round(2)),
            ("graded_submissions", Expr::field("graded_submissions")),
        ])
        .sort(vec![("average_grade", SortOrder::Desc), ("username", SortOrder::Asc)])
}

/// Mean grade of each student over graded submissions
pub async fn average_grade_per_student(db: &Database) -> Result<Vec<StudentGrade>> {
    student_grades().run_as(db).await
}

/// The best `limit` students by mean grade
pub async fn top_students(db: &Database, limit: usize) -> Result<Vec<StudentGrade>> {
    student_grades().limit(limit).run_as(db).await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRate {
    pub course_id: String,
    pub course_title: String,
    pub total_enrollments: i64,
    pub completed: i64,
    /// Percentage of enrollments that are completed
    pub completion_rate: f64,
}

pub async fn completion_rate_per_course(db: &Database) -> Result<Vec<CompletionRate>> {
    Pipeline::over(ENROLLMENTS)
        .group(
            Expr::field("course_id"),
            vec![
                ("total_enrollments", Accumulator::Count),
                ("completed", Accumulator::CountIf(Filter::eq("status", "completed"))),
            ],
        )
        .add_fields(vec![(
            "completion_rate",
            Expr::field("completed")
                .divide(Expr::field("total_enrollments"))
                .multiply(Expr::lit(100i64))
                .round(2)
                .or_else(Expr::lit(0.0)),
        )])
        .join(COURSES, "_id", "_id", "course")
        .project(vec![
            ("course_id", Expr::field("_id")),
            ("course_title", Expr::field("course.title")),
            ("total_enrollments", Expr::field("total_enrollments")),
            ("completed", Expr::field("completed")),
            ("completion_rate", Expr::field("completion_rate")),
        ])
        .sort(vec![("completion_rate", SortOrder::Desc), ("course_title", SortOrder::Asc)])
        .run_as(db)
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructorStudents {
    pub instructor_id: String,
    pub instructor_name: Option<String>,
    pub total_students: i64,
}

/// Distinct students taught across each instructor's courses
pub async fn students_per_instructor(db: &Database) -> Result<Vec<InstructorStudents>> {
    Pipeline::over(ENROLLMENTS)
        .join(COURSES, "course_id", "_id", "course")
        .group(
            Expr::field("course.instructor_id"),
            vec![("students", Accumulator::AddToSet(Expr::field("student_id")))],
        )
        .join(USERS, "_id", "_id", "instructor")
        .project(vec![
            ("instructor_id", Expr::field("_id")),
            ("instructor_name", Expr::full_name("instructor")),
            ("total_students", Expr::field("students").size()),
        ])
        .sort(vec![("total_students", SortOrder::Desc), ("instructor_name", SortOrder::Asc)])
        .run_as(db)
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructorGrade {
    pub instructor_id: String,
    pub instructor_name: Option<String>,
    pub average_grade: f64,
    pub graded_submissions: i64,
}

/// Mean grade over all graded submissions in each instructor's courses
pub async fn average_grade_per_instructor(db: &Database) -> Result<Vec<InstructorGrade>> {
    graded_submissions_with_course()
        .group(
            Expr::field("course.instructor_id"),
            vec![
                ("average_grade", Accumulator::Avg(Expr::field("grade"))),
                ("graded_submissions", Accumulator::Count),
            ],
        )
        .join(USERS, "_id", "_id", "instructor")
        .project(vec![
            ("instructor_id", Expr::field("_id")),
            ("instructor_name", Expr::full_name("instructor")),
            ("average_grade", Expr::field("average_grade").round(2)),
            ("graded_submissions", Expr::field("graded_submissions")),
        ])
        .sort(vec![("average_grade", SortOrder::Desc), ("instructor_name", SortOrder::Asc)])
        .run_as(db)
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructorValue {
    pub instructor_id: String,
    pub instructor_name: Option<String>,
    pub course_count: i64,
    /// Sum of course prices; unpriced courses count as zero
    pub total_value: f64,
}

pub async fn course_value_per_instructor(db: &Database) -> Result<Vec<InstructorValue>> {
    Pipeline::over(COURSES)
        .group(
            Expr::field("instructor_id"),
            vec![
                ("course_count", Accumulator::Count),
                ("total_value", Accumulator::Sum(Expr::field("price"))),
            ],
        )
        .join(USERS, "_id", "_id", "instructor")
        .project(vec![
            ("instructor_id", Expr::field("_id")),
            ("instructor_name", Expr::full_name("instructor")),
            ("course_count", Expr::field("course_count")),
            ("total_value", Expr::field("total_value").round(2)),
        ])
        .sort(vec![("total_value", SortOrder::Desc), ("instructor_name", SortOrder::Asc)])
        .run_as(db)
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyEnrollments {
    pub year: i64,
    pub month: i64,
    pub enrollment_count: i64,
}

/// Enrollments per calendar month, oldest first
pub async fn monthly_enrollment_trends(db: &Database) -> Result<Vec<MonthlyEnrollments>> {
    Pipeline::over(ENROLLMENTS)
        .group(
            Expr::Object(vec![
                ("year".to_string(), Expr::field("enrollment_date").year()),
                ("month".to_string(), Expr::field("enrollment_date").month()),
            ]),
            vec![("enrollment_count", Accumulator::Count)],
        )
        .project(vec![
            ("year", Expr::field("_id.year")),
            ("month", Expr::field("_id.month")),
            ("enrollment_count", Expr::field("enrollment_count")),
        ])
        .sort(vec![("year", SortOrder::Asc), ("month", SortOrder::Asc)])
        .run_as(db)
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentEngagement {
    pub student_id: String,
    pub username: String,
    pub student_name: Option<String>,
    pub submission_count: i64,
}

/// Submissions per student, most active first
pub async fn student_engagement(db: &Database) -> Result<Vec<StudentEngagement>> {
    Pipeline::over(SUBMISSIONS)
        .group(Expr::field("student_id"), vec![("submission_count", Accumulator::Count)])
        .join(USERS, "_id", "_id", "student")
        .project(vec![
            ("student_id", Expr::field("_id")),
            ("username", Expr::field("student.username")),
            ("student_name", Expr::full_name("student")),
            ("submission_count", Expr::field("submission_count")),
        ])
        .sort(vec![("submission_count", SortOrder::Desc), ("username", SortOrder::Asc)])
        .run_as(db)
        .await
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub course_id: String,
    pub title: String,
    pub category: Option<String>,
    /// Students of the target course also enrolled here
    pub co_enrollments: i64,
}

/// Courses most often taken by students of the course whose title contains
/// `title` (case-insensitive). An unknown course yields nothing.
pub async fn recommendations(db: &Database, title: &str, limit: usize) -> Result<Vec<Recommendation>> {
    let Some(target) = crate::repo::courses::search_title(db, title).await?.into_iter().next() else {
        tracing::info!("No course matching '{}' to recommend from", title);
        return Ok(Vec::new());
    };

    let students: Vec<String> = crate::repo::enrollments::for_course(db, &target.id)
        .await?
        .into_iter()
        .map(|e| e.student_id)
        .collect();
    if students.is_empty() {
        return Ok(Vec::new());
    }

    Pipeline::over(ENROLLMENTS)
        .filter(Filter::any_of("student_id", students).and(Filter::ne("course_id", target.id.as_str())))
        .group(
            Expr::field("course_id"),
            vec![("students", Accumulator::AddToSet(Expr::field("student_id")))],
        )
        .join(COURSES, "_id", "_id", "course")
        .project(vec![
            ("course_id", Expr::field("_id")),
            ("title", Expr::field("course.title")),
            ("category", Expr::field("course.category")),
            ("co_enrollments", Expr::field("students").size()),
        ])
        .sort(vec![("co_enrollments", SortOrder::Desc), ("title", SortOrder::Asc)])
        .limit(limit)
        .run_as(db)
        .await
}

/// Reports that take no arguments beyond the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    EnrollmentsPerCourse,
    AverageGradePerCourse,
    CoursesByCategory,
    AverageGradePerStudent,
    CompletionRate,
    TopStudents,
    StudentsPerInstructor,
    AverageGradePerInstructor,
    CourseValuePerInstructor,
    MonthlyTrends,
    PopularCategories,
    StudentEngagement,
}

impl Report {
    pub const ALL: [Report; 12] = [
        Report::EnrollmentsPerCourse,
        Report::AverageGradePerCourse,
        Report::CoursesByCategory,
        Report::AverageGradePerStudent,
        Report::CompletionRate,
        Report::TopStudents,
        Report::StudentsPerInstructor,
        Report::AverageGradePerInstructor,
        Report::CourseValuePerInstructor,
        Report::MonthlyTrends,
        Report::PopularCategories,
        Report::StudentEngagement,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Report::EnrollmentsPerCourse => "enrollments-per-course",
            Report::AverageGradePerCourse => "average-grade-per-course",
            Report::CoursesByCategory => "courses-by-category",
            Report::AverageGradePerStudent => "average-grade-per-student",
            Report::CompletionRate => "completion-rate",
            Report::TopStudents => "top-students",
            Report::StudentsPerInstructor => "students-per-instructor",
            Report::AverageGradePerInstructor => "average-grade-per-instructor",
            Report::CourseValuePerInstructor => "course-value-per-instructor",
            Report::MonthlyTrends => "monthly-trends",
            Report::PopularCategories => "popular-categories",
            Report::StudentEngagement => "student-engagement",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Report::EnrollmentsPerCourse => "Enrollments per course",
            Report::AverageGradePerCourse => "Average grade per course",
            Report::CoursesByCategory => "Courses by category",
            Report::AverageGradePerStudent => "Average grade per student",
            Report::CompletionRate => "Completion rate per course",
            Report::TopStudents => "Top performing students",
            Report::StudentsPerInstructor => "Students per instructor",
            Report::AverageGradePerInstructor => "Average grade per instructor",
            Report::CourseValuePerInstructor => "Course value per instructor",
            Report::MonthlyTrends => "Monthly enrollment trends",
            Report::PopularCategories => "Most popular categories",
            Report::StudentEngagement => "Student engagement",
        }
    }

    /// Run the report, rows as JSON objects
    pub async fn run(&self, db: &Database) -> Result<Vec<serde_json::Value>> {
        let rows = match self {
            Report::EnrollmentsPerCourse => to_json(enrollments_per_course(db).await?)?,
            Report::AverageGradePerCourse => to_json(average_grade_per_course(db).await?)?,
            Report::CoursesByCategory => to_json(courses_by_category(db).await?)?,
            Report::AverageGradePerStudent => to_json(average_grade_per_student(db).await?)?,
            Report::CompletionRate => to_json(completion_rate_per_course(db).await?)?,
            Report::TopStudents => to_json(top_students(db, DEFAULT_TOP_STUDENTS).await?)?,
            Report::StudentsPerInstructor => to_json(students_per_instructor(db).await?)?,
            Report::AverageGradePerInstructor => to_json(average_grade_per_instructor(db).await?)?,
            Report::CourseValuePerInstructor => to_json(course_value_per_instructor(db).await?)?,
            Report::MonthlyTrends => to_json(monthly_enrollment_trends(db).await?)?,
            Report::PopularCategories => to_json(popular_categories(db).await?)?,
            Report::StudentEngagement => to_json(student_engagement(db).await?)?,
        };
        tracing::info!("Report {} produced {} rows", self.name(), rows.len());
        Ok(rows)
    }
}

fn to_json<T: Serialize>(rows: Vec<T>) -> Result<Vec<serde_json::Value>> {
    rows.iter()
        .map(|row| serde_json::to_value(row).map_err(Error::from))
        .collect()
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Report {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Report::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| Error::InvalidArgument {
                message: format!(
                    "unknown report '{}', expected one of: {}",
                    s,
                    Report::ALL.map(|r| r.name()).join(", ")
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Enrollment, EnrollmentStatus, Level};
    use crate::repo::{assignments, courses, enrollments, lessons, submissions, users};
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        db: Database,
        alice: String,
        python: String,
        web: String,
        ml: String,
        frank: String,
        grace: String,
    }

    async fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let mut db = Database::open(tmp.path()).await.unwrap();
        db.apply_validators().await.unwrap();

        let alice = users::add_instructor(&db, users::NewUser::new("alice", "alice@example.com", "h").named("Alice", "Smith"))
            .await
            .unwrap()
            .id;
        let bob = users::add_instructor(&db, users::NewUser::new("bob", "bob@example.com", "h").named("Bob", "Johnson"))
            .await
            .unwrap()
            .id;
        let frank = users::add_student(&db, users::NewUser::new("frank", "frank@example.com", "h").named("Frank", "Wilson"))
            .await
            .unwrap()
            .id;
        let grace = users::add_student(&db, users::NewUser::new("grace", "grace@example.com", "h").named("Grace", "Lee"))
            .await
            .unwrap()
            .id;

        let course = |title: &str, instructor: &str, category: Option<&str>, price: f64| {
            let mut new = courses::NewCourse::new(title, "A course description long enough.", instructor)
                .level(Level::Beginner)
                .price(price);
            if let Some(category) = category {
                new = new.category(category);
            }
            new
        };
        let python = courses::create(&db, course("Python Basics", &alice, Some("Programming"), 50.0))
            .await
            .unwrap()
            .id;
        let web = courses::create(&db, course("Web Development", &alice, Some("Programming"), 100.0))
            .await
            .unwrap()
            .id;
        let ml = courses::create(&db, course("Machine Learning", &bob, Some("Data Science"), 200.0))
            .await
            .unwrap()
            .id;
        courses::create(&db, course("Misc Topics", &bob, None, 10.5)).await.unwrap();

        let march = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let enrol = |student: &str, course: &str, status, date| Enrollment {
            id: crate::entities::new_id(),
            student_id: student.to_string(),
            course_id: course.to_string(),
            enrollment_date: date,
            status,
        };
        for e in [
            enrol(&frank, &python, EnrollmentStatus::Completed, march),
            enrol(&frank, &web, EnrollmentStatus::Active, march + Duration::days(30)),
            enrol(&grace, &python, EnrollmentStatus::Active, march - Duration::days(60)),
            enrol(&grace, &ml, EnrollmentStatus::Dropped, march),
        ] {
            enrollments::enroll_record(&db, e).await.unwrap();
        }

        let lesson = lessons::add(&db, &python, "Lesson 1: Variables", "Names, values and simple types in depth.")
            .await
            .unwrap();
        let assignment = assignments::create(
            &db,
            assignments::NewAssignment {
                lesson_id: lesson.id,
                title: "Quiz 1: Variables".into(),
                description: "Short questions on variables.".into(),
                due_date: march + Duration::days(7),
                max_score: Some(100.0),
            },
        )
        .await
        .unwrap();
        for (student, grade) in [(&frank, Some(90.0)), (&grace, Some(75.0)), (&grace, None)] {
            submissions::submit(
                &db,
                submissions::NewSubmission {
                    assignment_id: assignment.id.clone(),
                    student_id: student.clone(),
                    content: "answers".into(),
                    grade,
                    feedback: None,
                },
            )
            .await
            .unwrap();
        }

        Fixture {
            _tmp: tmp,
            db,
            alice,
            python,
            web,
            ml,
            frank,
            grace,
        }
    }

    #[test]
    fn test_report_names_round_trip() {
        for report in Report::ALL {
            assert_eq!(report.name().parse::<Report>().unwrap(), report);
        }
        assert!("bogus".parse::<Report>().unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_enrollment_reports() {
        let f = fixture().await;

        let per_course = enrollments_per_course(&f.db).await.unwrap();
        assert_eq!(per_course[0].course_id, f.python);
        assert_eq!(per_course[0].total_enrollments, 2);
        assert_eq!(per_course.len(), 3);

        let rates = completion_rate_per_course(&f.db).await.unwrap();
        let python = rates.iter().find(|r| r.course_id == f.python).unwrap();
        assert_eq!(python.completion_rate, 50.0);
        let ml = rates.iter().find(|r| r.course_id == f.ml).unwrap();
        assert_eq!(ml.completion_rate, 0.0);

        let trends = monthly_enrollment_trends(&f.db).await.unwrap();
        let months: Vec<(i64, i64, i64)> = trends.iter().map(|t| (t.year, t.month, t.enrollment_count)).collect();
        assert_eq!(months, vec![(2024, 1, 1), (2024, 3, 2), (2024, 4, 1)]);

        let taught = students_per_instructor(&f.db).await.unwrap();
        assert_eq!(taught[0].instructor_id, f.alice);
        assert_eq!(taught[0].total_students, 2);
        assert_eq!(taught[0].instructor_name.as_deref(), Some("Alice Smith"));
    }

    #[tokio::test]
    async fn test_category_counts_cover_all_courses() {
        let f = fixture().await;

        let categories = courses_by_category(&f.db).await.unwrap();
        let total: i64 = categories.iter().map(|c| c.course_count).sum();
        assert_eq!(total, 4);
        assert_eq!(categories[0].category.as_deref(), Some("Programming"));
        assert!(categories.iter().any(|c| c.category.is_none()));

        let popular = popular_categories(&f.db).await.unwrap();
        assert_eq!(popular.len(), 2);
        assert!(popular.iter().all(|c| c.category.is_some()));

        let value = course_value_per_instructor(&f.db).await.unwrap();
        assert_eq!(value[0].total_value, 210.5);
        assert_eq!(value[1].total_value, 150.0);
    }

    #[tokio::test]
    async fn test_grade_reports_skip_ungraded() {
        let f = fixture().await;

        let per_course = average_grade_per_course(&f.db).await.unwrap();
        assert_eq!(per_course.len(), 1);
        assert_eq!(per_course[0].course_title, "Python Basics");
        assert_eq!(per_course[0].average_grade, 82.5);
        assert_eq!(per_course[0].graded_submissions, 2);

        let students = average_grade_per_student(&f.db).await.unwrap();
        assert_eq!(students[0].student_id, f.frank);
        assert_eq!(students[1].average_grade, 75.0);

        let top = top_students(&f.db, 1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].username, "frank");

        let instructors = average_grade_per_instructor(&f.db).await.unwrap();
        assert_eq!(instructors.len(), 1);
        assert_eq!(instructors[0].instructor_id, f.alice);

        let engagement = student_engagement(&f.db).await.unwrap();
        assert_eq!(engagement[0].student_id, f.grace);
        assert_eq!(engagement[0].submission_count, 2);
    }

    #[tokio::test]
    async fn test_recommendations() {
        let f = fixture().await;

        let recs = recommendations(&f.db, "python", DEFAULT_RECOMMENDATIONS).await.unwrap();
        let ids: Vec<&str> = recs.iter().map(|r| r.course_id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&f.web.as_str()));
        assert!(ids.contains(&f.ml.as_str()));
        assert!(recs.iter().all(|r| r.co_enrollments == 1));

        assert_eq!(recommendations(&f.db, "python", 1).await.unwrap().len(), 1);
        assert!(recommendations(&f.db, "underwater basket weaving", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_run_by_name() {
        let f = fixture().await;
        for report in Report::ALL {
            report.run(&f.db).await.unwrap();
        }
        let rows = Report::EnrollmentsPerCourse.run(&f.db).await.unwrap();
        assert_eq!(rows[0]["course_title"], "Python Basics");
    }
}
