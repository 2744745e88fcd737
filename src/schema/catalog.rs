//! Built-in validators for the EduHub collections

use super::{FieldDef, FieldType, Schema};

pub const USERS: &str = "users";
pub const COURSES: &str = "courses";
pub const ENROLLMENTS: &str = "enrollments";
pub const LESSONS: &str = "lessons";
pub const ASSIGNMENTS: &str = "assignments";
pub const SUBMISSIONS: &str = "submissions";

/// Every live entity collection, in dependency order
pub const ENTITY_COLLECTIONS: [&str; 6] = [USERS, COURSES, ENROLLMENTS, LESSONS, ASSIGNMENTS, SUBMISSIONS];

pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

fn string() -> FieldDef {
    FieldDef::new(FieldType::String)
}

fn datetime() -> FieldDef {
    FieldDef::new(FieldType::DateTime)
}

fn reference(target: &str) -> FieldDef {
    FieldDef::new(FieldType::Ref(target.to_string()))
        .required()
        .describe(format!("id of a document in '{}'", target))
}

fn string_list() -> FieldDef {
    FieldDef::new(FieldType::Array(Box::new(FieldType::String)))
}

pub fn users() -> Schema {
    Schema::new(USERS)
        .with_description("Students and instructors")
        .field("username", string().required().min_length(3))
        .field("email", string().required().unique().pattern(EMAIL_PATTERN))
        .field("password_hash", string().required())
        .field("role", string().required().one_of(&["student", "instructor"]))
        .field("created_at", datetime().required())
        .field("updated_at", datetime().required())
        .field("first_name", string())
        .field("last_name", string())
        .field(
            "profile",
            FieldDef::new(FieldType::Object)
                .property("bio", string())
                .property("avatar", string())
                .property("skills", string_list()),
        )
        .field("is_active", FieldDef::new(FieldType::Bool))
}

pub fn courses() -> Schema {
    Schema::new(COURSES)
        .with_description("Courses offered by instructors")
        .field("title", string().required().min_length(5))
        .field("description", string().required().min_length(10))
        .field("instructor_id", reference(USERS))
        .field("category", string())
        .field("level", string().one_of(&["beginner", "intermediate", "advanced"]))
        .field("duration", FieldDef::new(FieldType::Float).range(Some(0.0), None))
        .field("price", FieldDef::new(FieldType::Float).range(Some(0.0), None))
        .field("tags", string_list())
        .field("created_at", datetime().required())
        .field("updated_at", datetime().required())
        .field("is_published", FieldDef::new(FieldType::Bool))
        .field("location", FieldDef::new(FieldType::GeoPoint))
}

fn enrollment_fields(schema: Schema) -> Schema {
    schema
        .field("student_id", reference(USERS))
        .field("course_id", reference(COURSES))
        .field("enrollment_date", datetime().required())
        .field(
            "status",
            string().required().one_of(&["active", "completed", "dropped"]),
        )
}

pub fn enrollments() -> Schema {
    enrollment_fields(Schema::new(ENROLLMENTS).with_description("Student enrollments in courses"))
}

/// Cold storage for aged enrollments, named by configuration
pub fn archived_enrollments(name: &str) -> Schema {
    enrollment_fields(Schema::new(name).with_description("Archived enrollments"))
        .field("archived_at", datetime().required())
}

pub fn lessons() -> Schema {
    Schema::new(LESSONS)
        .with_description("Ordered lessons of a course")
        .with_body_field("content")
        .field("course_id", reference(COURSES))
        .field("title", string().required().min_length(5))
        .field("content", string().required().min_length(20))
        .field(
            "order",
            FieldDef::new(FieldType::Int).required().range(Some(1.0), None),
        )
        .field("created_at", datetime())
        .field("updated_at", datetime())
}

pub fn assignments() -> Schema {
    Schema::new(ASSIGNMENTS)
        .with_description("Assignments attached to lessons")
        .field("lesson_id", reference(LESSONS))
        .field("title", string().required().min_length(5))
        .field("description", string().required().min_length(10))
        .field("due_date", datetime().required())
        .field("max_score", FieldDef::new(FieldType::Float).range(Some(0.0), None))
        .field("created_at", datetime())
        .field("updated_at", datetime())
}

pub fn submissions() -> Schema {
    Schema::new(SUBMISSIONS)
        .with_description("Student submissions for assignments")
        .field("assignment_id", reference(ASSIGNMENTS))
        .field("student_id", reference(USERS))
        .field("submission_date", datetime().required())
        .field("content", string().required().min_length(1))
        .field(
            "grade",
            FieldDef::new(FieldType::Float)
                .nullable()
                .range(Some(0.0), Some(100.0)),
        )
        .field("feedback", string().nullable())
        .field("created_at", datetime())
        .field("updated_at", datetime())
}

/// The full validator set for the live collections
pub fn all() -> Vec<Schema> {
    vec![users(), courses(), enrollments(), lessons(), assignments(), submissions()]
}
