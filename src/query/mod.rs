//! Query layer for EduHub
//!
//! Filters select documents; pipelines join, group and reshape them.

pub mod filter;
pub mod pipeline;

pub use filter::Filter;
pub use pipeline::{Accumulator, Expr, Pipeline, Row, SortOrder, Stage};
