//! Timestamped row representation.

use chrono::NaiveDateTime;

/// Column names in storage order, shared by the CSV adapters and summaries.
pub const FIELD_NAMES: [&str; 5] = ["open", "high", "low", "close", "volume"];

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Row {
    /// Numeric fields in [`FIELD_NAMES`] order.
    pub fn fields(&self) -> [f64; 5] {
        [self.open, self.high, self.low, self.close, self.volume]
    }
}
