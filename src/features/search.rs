//! Relevance-ranked text search over course titles and descriptions
//!
//! Title and description are tokenized into one bag of terms per course and
//! scored with BM25 against the whole course collection.

use crate::entities::{Course, Entity};
use crate::error::Result;
use crate::query::filter::Filter;
use crate::schema::catalog::COURSES;
use crate::Database;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const K1: f64 = 1.2;
const B: f64 = 0.75;

const STOP_WORDS: &[&str] = &[
    "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "in", "is", "it", "its",
    "of", "on", "or", "that", "the", "this", "to", "was", "were", "will", "with",
];

/// Lowercase, split on non-alphanumerics, drop one-character tokens and
/// stop words
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| s.chars().count() >= 2 && !STOP_WORDS.contains(s))
        .map(String::from)
        .collect()
}

/// Tokenize and deduplicate, keeping first-seen order
pub fn tokenize_unique(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub course_id: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub score: f64,
}

struct Corpus {
    docs: Vec<(Course, HashMap<String, usize>, usize)>,
    doc_freqs: HashMap<String, usize>,
    avg_len: f64,
}

impl Corpus {
    fn build(courses: Vec<Course>) -> Self {
        let mut doc_freqs: HashMap<String, usize> = HashMap::new();
        let mut total_len = 0usize;
        let docs: Vec<_> = courses
            .into_iter()
            .map(|course| {
                let tokens = tokenize(&format!("{} {}", course.title, course.description));
                let mut tf: HashMap<String, usize> = HashMap::new();
                for t in &tokens {
                    *tf.entry(t.clone()).or_default() += 1;
                }
                for term in tf.keys() {
                    *doc_freqs.entry(term.clone()).or_default() += 1;
                }
                total_len += tokens.len();
                (course, tf, tokens.len())
            })
            .collect();

        let avg_len = if docs.is_empty() {
            0.0
        } else {
            total_len as f64 / docs.len() as f64
        };

        Self {
            docs,
            doc_freqs,
            avg_len,
        }
    }

    /// IDF(t) = ln((N - df + 0.5) / (df + 0.5) + 1)
    fn idf(&self, term: &str) -> f64 {
        let df = self.doc_freqs.get(term).copied().unwrap_or(0) as f64;
        let n = self.docs.len() as f64;
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    fn score(&self, tf: &HashMap<String, usize>, len: usize, terms: &[String]) -> f64 {
        let norm = if self.avg_len > 0.0 {
            1.0 - B + B * len as f64 / self.avg_len
        } else {
            1.0
        };
        terms
            .iter()
            .filter_map(|term| {
                let f = *tf.get(term)? as f64;
                Some(self.idf(term) * f * (K1 + 1.0) / (f + K1 * norm))
            })
            .sum()
    }
}

/// Courses matching any query term, best match first
pub async fn search_courses(db: &Database, query: &str) -> Result<Vec<SearchHit>> {
    let terms = tokenize_unique(query);
    if terms.is_empty() {
        return Ok(Vec::new());
    }

    let courses = db
        .find(COURSES, &Filter::All)
        .await?
        .iter()
        .map(Course::from_document)
        .collect::<Result<Vec<_>>>()?;
    let corpus = Corpus::build(courses);

    let mut hits: Vec<SearchHit> = corpus
        .docs
        .iter()
        .filter_map(|(course, tf, len)| {
            let score = corpus.score(tf, *len, &terms);
            (score > 0.0).then(|| SearchHit {
                course_id: course.id.clone(),
                title: course.title.clone(),
                description: course.description.clone(),
                category: course.category.clone(),
                score,
            })
        })
        .collect();

    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.title.cmp(&b.title)));
    tracing::debug!("Search {:?} matched {} courses", terms, hits.len());
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn course(id: &str, title: &str, description: &str) -> Course {
        Course {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            instructor_id: "u-1".into(),
            category: None,
            level: None,
            duration: None,
            price: None,
            tags: vec![],
            is_published: true,
            location: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Intro to Python, 101!"), vec!["intro", "python", "101"]);
        assert_eq!(tokenize("A is a test"), vec!["test"]);
        assert_eq!(tokenize_unique("python Python PYTHON data"), vec!["python", "data"]);
    }

    #[test]
    fn test_bm25_prefers_denser_match() {
        let corpus = Corpus::build(vec![
            course("a", "Python Basics", "Learn python step by step with python exercises."),
            course("b", "Data Science", "Uses python for analysis of large datasets and charts."),
            course("c", "Graphic Design", "Colour theory and typography for print."),
        ]);
        let terms = vec!["python".to_string()];
        let scores: Vec<f64> = corpus
            .docs
            .iter()
            .map(|(_, tf, len)| corpus.score(tf, *len, &terms))
            .collect();

        assert!(scores[0] > scores[1]);
        assert!(scores[1] > 0.0);
        assert_eq!(scores[2], 0.0);
    }
}
