//! Line/column positions.
//!
//! Tokens and edits carry byte offsets, while source maps want 0-indexed
//! lines and UTF-16 columns. `LineMap` converts between the two.

use serde::{Deserialize, Serialize};

/// A position in a source file (0-indexed line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// 0-indexed line number
    pub line: u32,
    /// 0-indexed column in UTF-16 code units
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

/// Line map for offset -> position conversion.
/// Stores the starting offset of each line.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Starting offset of each line (line_starts[0] is always 0)
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map from source text.
    pub fn build(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut line_starts = vec![0u32];

        for (i, &byte) in bytes.iter().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            } else if byte == b'\r' && bytes.get(i + 1) != Some(&b'\n') {
                // Lone \r; \r\n is counted at the \n
                line_starts.push((i + 1) as u32);
            }
        }

        LineMap { line_starts }
    }

    /// Convert a byte offset to a Position.
    /// Offsets past the end are clamped to the end of the text.
    pub fn offset_to_position(&self, offset: u32, source: &str) -> Position {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert_point) => insert_point.saturating_sub(1),
        };

        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let clamped_end = (offset as usize).min(source.len());
        let start = (line_start as usize).min(clamped_end);
        let slice = source.get(start..clamped_end).unwrap_or("");
        let character = slice.chars().map(|ch| ch.len_utf16() as u32).sum();

        Position {
            line: line as u32,
            character,
        }
    }
}
