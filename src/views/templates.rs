//! Template engine for views

use std::collections::HashMap;
use std::path::Path;
use tera::{Context, Tera};
use walkdir::WalkDir;

use crate::error::Result;

pub const REPORT_TEMPLATE: &str = "report.html";
pub const OUTLINE_TEMPLATE: &str = "outline.html";

/// Template engine wrapper
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Built-in templates, overridden by any `*.html` file of the same name
    /// under `templates_dir`
    pub fn new(templates_dir: &Path) -> Result<Self> {
        let mut engine = Self::builtin()?;
        if !templates_dir.is_dir() {
            return Ok(engine);
        }

        for entry in WalkDir::new(templates_dir).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() || path.extension().map(|e| e != "html").unwrap_or(true) {
                continue;
            }
            let name = path
                .strip_prefix(templates_dir)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            let content = std::fs::read_to_string(path).map_err(|source| crate::Error::FileReadError {
                path: path.to_path_buf(),
                source,
            })?;
            engine.add_template(&name, &content)?;
            tracing::debug!("Loaded template override {}", name);
        }
        Ok(engine)
    }

    /// Only the built-in templates
    pub fn builtin() -> Result<Self> {
        let mut engine = Self::empty();
        engine.add_template(REPORT_TEMPLATE, Self::report_template())?;
        engine.add_template(OUTLINE_TEMPLATE, Self::outline_template())?;
        Ok(engine)
    }

    /// Create an empty template engine
    pub fn empty() -> Self {
        let mut tera = Tera::default();
        tera.register_filter("markdown", markdown_filter);
        Self { tera }
    }

    /// Add a template from a string
    pub fn add_template(&mut self, name: &str, content: &str) -> Result<()> {
        self.tera.add_raw_template(name, content)?;
        Ok(())
    }

    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Table of report rows; expects `title`, `columns` and `rows` (cells as strings)
    pub fn report_template() -> &'static str {
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{ title }}</title>
    <style>
        body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; }
        table { border-collapse: collapse; width: 100%; }
        th, td { text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid #eee; }
        th { background: #fafafa; }
        .meta { color: #666; font-size: 0.9rem; }
    </style>
</head>
<body>
    <h1>{{ title }}</h1>
    <p class="meta">{{ rows | length }} row(s), generated {{ generated_at }}</p>

    {% if rows %}
    <table>
        <thead>
            <tr>{% for column in columns %}<th>{{ column }}</th>{% endfor %}</tr>
        </thead>
        <tbody>
        {% for row in rows %}
            <tr>{% for cell in row %}<td>{{ cell }}</td>{% endfor %}</tr>
        {% endfor %}
        </tbody>
    </table>
    {% else %}
    <p>No data.</p>
    {% endif %}
</body>
</html>"#
    }

    /// A course and its lessons; expects `course`, `instructor_name` and `lessons`
    pub fn outline_template() -> &'static str {
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{ course.title }}</title>
    <style>
        body { font-family: system-ui, sans-serif; max-width: 800px; margin: 2rem auto; padding: 0 1rem; }
        article { border-bottom: 1px solid #eee; padding: 1rem 0; }
        h2 { margin: 0 0 0.5rem; }
        .meta { color: #666; font-size: 0.9rem; }
    </style>
</head>
<body>
    <h1>{{ course.title }}</h1>
    <div class="meta">
        {% if instructor_name %}<span>By {{ instructor_name }}</span>{% endif %}
        {% if course.category %}<span> · {{ course.category }}</span>{% endif %}
        {% if course.level %}<span> · {{ course.level }}</span>{% endif %}
        {% if course.tags %}<span> · Tags: {{ course.tags | join(sep=", ") }}</span>{% endif %}
    </div>
    <p>{{ course.description }}</p>

    {% if lessons %}
    {% for lesson in lessons %}
    <article>
        <h2>{{ lesson.order }}. {{ lesson.title }}</h2>
        <div class="body">{{ lesson.content | markdown | safe }}</div>
    </article>
    {% endfor %}
    {% else %}
    <p>No lessons yet.</p>
    {% endif %}
</body>
</html>"#
    }
}

/// Tera filter to convert markdown to HTML
fn markdown_filter(value: &tera::Value, _args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
    let text = value.as_str().unwrap_or("");
    let parser = pulldown_cmark::Parser::new(text);
    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, parser);
    Ok(tera::Value::String(html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_markdown_filter() {
        let mut engine = TemplateEngine::empty();
        engine.add_template("t", "{{ text | markdown | safe }}").unwrap();
        let mut context = Context::new();
        context.insert("text", "**bold**");
        let html = engine.render("t", &context).unwrap();
        assert_eq!(html.trim(), "<p><strong>bold</strong></p>");
    }

    #[test]
    fn test_override_from_directory() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(REPORT_TEMPLATE), "custom {{ title }}").unwrap();

        let engine = TemplateEngine::new(tmp.path()).unwrap();
        let mut context = Context::new();
        context.insert("title", "Trends");
        assert_eq!(engine.render(REPORT_TEMPLATE, &context).unwrap(), "custom Trends");

        let missing = TemplateEngine::new(&tmp.path().join("nope")).unwrap();
        context.insert("columns", &Vec::<String>::new());
        context.insert("rows", &Vec::<Vec<String>>::new());
        context.insert("generated_at", "now");
        assert!(missing.render(REPORT_TEMPLATE, &context).unwrap().contains("No data."));
    }
}
