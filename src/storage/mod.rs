//! Storage layer for EduHub
//!
//! Handles reading/writing markdown documents with YAML frontmatter.

pub mod collection;
pub mod document;
pub mod frontmatter;
