//! Views: reports and course outlines rendered to static files
//!
//! # View Output Structure
//!
//! ```text
//! /views/
//!   /reports/
//!     /enrollments-per-course/
//!       index.html       # Table of report rows
//!       index.json       # Rows as JSON
//!   /courses/
//!     /{course_id}/
//!       index.html       # Course outline with rendered lessons
//!       index.json
//! ```
//!
//! The output root is `views_dir` from the config. Templates use Tera
//! syntax; a file in `/.eduhub/templates/` replaces the built-in template of
//! the same name (`report.html`, `outline.html`). Lesson content goes
//! through the `markdown` filter:
//!
//! ```html
//! {% for lesson in lessons %}
//! <article>
//!   <h2>{{ lesson.title }}</h2>
//!   <div>{{ lesson.content | markdown | safe }}</div>
//! </article>
//! {% endfor %}
//! ```

mod templates;

pub use templates::{TemplateEngine, OUTLINE_TEMPLATE, REPORT_TEMPLATE};

use crate::entities::{Course, User};
use crate::error::{Error, Result};
use crate::repo;
use crate::reports::Report;
use crate::Database;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tera::Context;
use tokio::fs;

/// Files written for one view
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedView {
    pub name: String,
    pub html: PathBuf,
    pub json: PathBuf,
    pub rows: usize,
}

fn views_root(db: &Database) -> PathBuf {
    db.root.join(&db.config.views_dir)
}

fn engine_for(db: &Database) -> Result<TemplateEngine> {
    TemplateEngine::new(&db.root.join(".eduhub").join("templates"))
}

async fn write_view(dir: &Path, html: String, json: &serde_json::Value) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir).await?;
    let html_path = dir.join("index.html");
    let json_path = dir.join("index.json");
    fs::write(&html_path, html).await.map_err(|source| Error::FileWriteError {
        path: html_path.clone(),
        source,
    })?;
    fs::write(&json_path, serde_json::to_string_pretty(json)?)
        .await
        .map_err(|source| Error::FileWriteError {
            path: json_path.clone(),
            source,
        })?;
    Ok((html_path, json_path))
}

fn cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Columns from the first row's keys, cells in the same order
fn table(rows: &[serde_json::Value]) -> (Vec<String>, Vec<Vec<String>>) {
    let columns: Vec<String> = rows
        .first()
        .and_then(|r| r.as_object())
        .map(|o| o.keys().cloned().collect())
        .unwrap_or_default();
    let cells = rows
        .iter()
        .map(|row| columns.iter().map(|c| cell(&row[c.as_str()])).collect())
        .collect();
    (columns, cells)
}

/// Run a report and write it as HTML and JSON
pub async fn render_report(db: &Database, report: Report) -> Result<RenderedView> {
    let rows = report.run(db).await?;
    let (columns, cells) = table(&rows);

    let mut context = Context::new();
    context.insert("title", report.title());
    context.insert("columns", &columns);
    context.insert("rows", &cells);
    context.insert("generated_at", &Utc::now().format("%Y-%m-%d %H:%M UTC").to_string());
    let html = engine_for(db)?.render(REPORT_TEMPLATE, &context)?;

    let dir = views_root(db).join("reports").join(report.name());
    let (html, json) = write_view(&dir, html, &serde_json::Value::Array(rows.clone())).await?;
    tracing::info!("Rendered report view: {}", report.name());

    Ok(RenderedView {
        name: report.name().to_string(),
        html,
        json,
        rows: rows.len(),
    })
}

/// Render every report; one failing report does not stop the others
pub async fn render_all_reports(db: &Database) -> Result<Vec<RenderedView>> {
    let mut rendered = Vec::new();
    for report in Report::ALL {
        match render_report(db, report).await {
            Ok(view) => rendered.push(view),
            Err(e) => tracing::error!("Failed to render report {}: {}", report, e),
        }
    }
    Ok(rendered)
}

/// Write a course with its ordered lessons as HTML and JSON
pub async fn render_course_outline(db: &Database, course_id: &str) -> Result<RenderedView> {
    let course: Course = repo::require(db, course_id).await?;
    let instructor: Option<User> = repo::load(db, &course.instructor_id).await?;
    let lessons = repo::lessons::list_for_course(db, course_id).await?;

    let instructor_name = instructor.map(|u| u.full_name());
    let mut context = Context::new();
    context.insert("course", &course);
    context.insert("instructor_name", &instructor_name);
    context.insert("lessons", &lessons);
    let html = engine_for(db)?.render(OUTLINE_TEMPLATE, &context)?;

    let json = serde_json::json!({
        "course": &course,
        "instructor_name": &instructor_name,
        "lessons": &lessons,
    });
    let dir = views_root(db).join("courses").join(course_id);
    let (html, json) = write_view(&dir, html, &json).await?;
    tracing::info!("Rendered outline of course {}", course_id);

    Ok(RenderedView {
        name: course.title,
        html,
        json,
        rows: lessons.len(),
    })
}
