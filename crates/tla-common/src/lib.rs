//! Common types and utilities for the tla rewriter.
//!
//! This crate provides foundational types used across all tla crates:
//! - Source spans (`ByteSpan`)
//! - Position types and the `LineMap` for line/column conversion
//! - Source map generation (v3, Base64 VLQ mappings)

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::ByteSpan;

// Position/Range types for line/column source locations
pub mod position;
pub use position::{LineMap, Position};

// Source Map generation
pub mod source_map;
pub use source_map::{Mapping, SourceMap, SourceMapGenerator};

#[cfg(test)]
#[path = "tests/position_tests.rs"]
mod position_tests;

#[cfg(test)]
#[path = "tests/source_map_tests.rs"]
mod source_map_tests;
