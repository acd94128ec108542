//! Full-text search over owned and shared content.

pub mod fts;
