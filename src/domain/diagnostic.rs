//! Structured diagnostic events emitted by the sampling core.

use crate::domain::interval::RowInterval;
use chrono::{NaiveDateTime, TimeDelta};
use std::fmt;

/// Why a sampling candidate was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// First row falls on a weekday outside the permitted set.
    Weekday,
    /// Actual span exceeds the target duration by at least the gap tolerance.
    Gap,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Weekday => f.write_str("not a good day to start"),
            Rejection::Gap => f.write_str("duration too big"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    RowsLoaded {
        rows: usize,
        span: TimeDelta,
    },
    DuplicatesRemoved {
        removed: usize,
    },
    CandidateRejected {
        attempt: usize,
        reason: Rejection,
        start: NaiveDateTime,
    },
    SampleAccepted {
        name: String,
        rows: RowInterval,
        attempts: usize,
        gap: TimeDelta,
    },
    SamplingExhausted {
        attempts: usize,
        interval: RowInterval,
    },
    UnknownConfigKey {
        section: String,
        key: String,
    },
    DeprecatedConfigKey {
        section: String,
        key: String,
        replacement: String,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::CandidateRejected { .. } => Severity::Debug,
            Diagnostic::RowsLoaded { .. } | Diagnostic::SampleAccepted { .. } => Severity::Info,
            Diagnostic::DuplicatesRemoved { .. }
            | Diagnostic::SamplingExhausted { .. }
            | Diagnostic::UnknownConfigKey { .. }
            | Diagnostic::DeprecatedConfigKey { .. } => Severity::Warning,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RowsLoaded { rows, span } => {
                write!(f, "loaded {} records spanning {} minutes", rows, span.num_minutes())
            }
            Diagnostic::DuplicatesRemoved { removed } => write!(
                f,
                "found {} duplicated date_time records, removed all but first occurrences",
                removed
            ),
            Diagnostic::CandidateRejected {
                attempt,
                reason,
                start,
            } => write!(f, "attempt {}: start {} rejected, {}", attempt, start, reason),
            Diagnostic::SampleAccepted {
                name,
                rows,
                attempts,
                gap,
            } => write!(
                f,
                "sample <{}> accepted at rows {} after {} attempts, time gap {} minutes",
                name,
                rows,
                attempts,
                gap.num_minutes()
            ),
            Diagnostic::SamplingExhausted { attempts, interval } => write!(
                f,
                "quitting after {} sampling attempts in {}",
                attempts, interval
            ),
            Diagnostic::UnknownConfigKey { section, key } => {
                write!(f, "unrecognized config key [{}] {} ignored", section, key)
            }
            Diagnostic::DeprecatedConfigKey {
                section,
                key,
                replacement,
            } => write!(
                f,
                "config key [{}] {} is deprecated, use {} instead",
                section, key, replacement
            ),
        }
    }
}
