//! Half-open row index ranges.

use std::fmt;
use std::ops::Range;

/// Half-open range `[start, end)` of row indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowInterval {
    pub start: usize,
    pub end: usize,
}

impl RowInterval {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty interval positioned at `at`.
    pub fn empty_at(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for RowInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
