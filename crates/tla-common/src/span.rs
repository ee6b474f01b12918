//! Byte-offset spans into source text.

use serde::{Deserialize, Serialize};

/// A half-open byte range `[start, end)` into a source file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ByteSpan {
    pub start: u32,
    pub end: u32,
}

impl ByteSpan {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        ByteSpan { start, end }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether `offset` falls inside this span.
    #[inline]
    pub const fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Two spans overlap unless one ends at or before the other starts.
    #[inline]
    pub const fn overlaps(&self, other: ByteSpan) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }

    /// Smallest span covering both.
    pub fn cover(self, other: ByteSpan) -> ByteSpan {
        ByteSpan::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Slice the span out of `source`, returning "" when it is out of range.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source
            .get(self.start as usize..self.end as usize)
            .unwrap_or("")
    }
}
