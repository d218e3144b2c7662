//! TimeSeriesStore: ordered, unique-timestamp row storage with nearest lookup.

use crate::domain::diagnostic::Diagnostic;
use crate::domain::error::EpisamplerError;
use crate::domain::interval::RowInterval;
use crate::domain::row::Row;
use crate::ports::diagnostic_port::DiagnosticSink;
use chrono::{NaiveDateTime, TimeDelta};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct TimeSeriesStore {
    rows: Vec<Row>,
    span: TimeDelta,
    duplicates_removed: usize,
}

impl TimeSeriesStore {
    /// Loads rows, dropping all but the first occurrence of each timestamp.
    ///
    /// Rows must be supplied in ascending timestamp order; no sorting is done.
    pub fn load(rows: Vec<Row>, sink: &dyn DiagnosticSink) -> Result<Self, EpisamplerError> {
        if rows.is_empty() {
            return Err(EpisamplerError::DataUnavailable {
                reason: "no rows supplied".into(),
            });
        }

        let total = rows.len();
        let mut seen = HashSet::with_capacity(total);
        let rows: Vec<Row> = rows
            .into_iter()
            .filter(|row| seen.insert(row.timestamp))
            .collect();
        let duplicates_removed = total - rows.len();
        if duplicates_removed > 0 {
            sink.emit(Diagnostic::DuplicatesRemoved {
                removed: duplicates_removed,
            });
        }

        if let Some(i) = rows.windows(2).position(|w| w[0].timestamp >= w[1].timestamp) {
            return Err(EpisamplerError::DataUnavailable {
                reason: format!(
                    "rows not in ascending order: {} followed by {} at row {}",
                    rows[i].timestamp,
                    rows[i + 1].timestamp,
                    i + 1
                ),
            });
        }

        let store = Self::from_ordered(rows, duplicates_removed);
        sink.emit(Diagnostic::RowsLoaded {
            rows: store.row_count(),
            span: store.span,
        });
        Ok(store)
    }

    /// Builds a store from rows already known to be unique and ascending.
    pub(crate) fn from_ordered(rows: Vec<Row>, duplicates_removed: usize) -> Self {
        let span = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => TimeDelta::zero(),
        };
        Self {
            rows,
            span,
            duplicates_removed,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn timestamp(&self, index: usize) -> Option<NaiveDateTime> {
        self.rows.get(index).map(|r| r.timestamp)
    }

    /// Wall-clock delta between the first and last row.
    pub fn span(&self) -> TimeDelta {
        self.span
    }

    pub fn duplicates_removed(&self) -> usize {
        self.duplicates_removed
    }

    /// Index of the row closest to `ts`; ties go to the earlier row.
    pub fn nearest_index(&self, ts: NaiveDateTime) -> usize {
        let after = self.rows.partition_point(|r| r.timestamp < ts);
        if after == 0 {
            return 0;
        }
        if after == self.rows.len() {
            return after - 1;
        }
        let before = after - 1;
        let to_before = ts - self.rows[before].timestamp;
        let to_after = self.rows[after].timestamp - ts;
        if to_after < to_before { after } else { before }
    }

    /// Owned copy of the rows inside `interval`.
    pub fn slice(&self, interval: RowInterval) -> Vec<Row> {
        let end = interval.end.min(self.rows.len());
        let start = interval.start.min(end);
        self.rows[start..end].to_vec()
    }
}
