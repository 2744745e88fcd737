//! Features built on top of the repositories
//!
//! - [`search`]: BM25 ranked course search
//! - [`geo`]: courses near a point
//! - [`archive`]: moving aged enrollments to cold storage

pub mod archive;
pub mod geo;
pub mod search;
