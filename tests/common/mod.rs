#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Weekday};
use episampler::domain::error::EpisamplerError;
use episampler::domain::params::{DurationSpec, WeekdaySet};
use episampler::domain::policy::{
    DomainParams, EpisodeParams, GenericParams, HierarchyPolicy, NodeKind, TrialParams,
};
pub use episampler::domain::row::Row;
use episampler::ports::data_port::DataPort;
use episampler::ports::feed_port::FeedPort;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<Row>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_rows(mut self, source: &str, rows: Vec<Row>) -> Self {
        self.data.insert(source.to_string(), rows);
        self
    }

    pub fn with_error(mut self, source: &str, reason: &str) -> Self {
        self.errors.insert(source.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_rows(&self, source: &str) -> Result<Vec<Row>, EpisamplerError> {
        if let Some(reason) = self.errors.get(source) {
            return Err(EpisamplerError::DataUnavailable {
                reason: reason.clone(),
            });
        }
        self.data
            .get(source)
            .cloned()
            .ok_or_else(|| EpisamplerError::DataUnavailable {
                reason: format!("unknown source {}", source),
            })
    }
}

/// Feed sink that keeps every dataset it receives.
pub struct RecordingFeed {
    pub written: RefCell<Vec<(String, Vec<Row>)>>,
}

impl RecordingFeed {
    pub fn new() -> Self {
        Self {
            written: RefCell::new(Vec::new()),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.written.borrow().iter().map(|(n, _)| n.clone()).collect()
    }
}

impl FeedPort for RecordingFeed {
    fn write(&self, name: &str, rows: &[Row]) -> Result<(), EpisamplerError> {
        self.written
            .borrow_mut()
            .push((name.to_string(), rows.to_vec()));
        Ok(())
    }
}

pub fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

pub fn make_row(timestamp: NaiveDateTime, close: f64) -> Row {
    Row {
        timestamp,
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

/// Contiguous rows every `step` starting at `start`.
pub fn generate_rows(start: NaiveDateTime, count: usize, step: TimeDelta) -> Vec<Row> {
    (0..count)
        .map(|i| make_row(start + step * i as i32, 100.0 + i as f64 * 0.01))
        .collect()
}

pub fn hourly_rows(days: usize) -> Vec<Row> {
    generate_rows(dt(2024, 1, 1, 0, 0), days * 24, TimeDelta::hours(1))
}

/// One-minute rows for `weekdays` full weekdays starting Monday 2024-01-01,
/// with nothing on Saturdays and Sundays.
pub fn minute_weekday_rows(weekdays: usize) -> Vec<Row> {
    let mut rows = Vec::with_capacity(weekdays * 1440);
    let mut day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut added = 0;
    while added < weekdays {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            let midnight = day.and_hms_opt(0, 0, 0).unwrap();
            rows.extend(generate_rows(midnight, 1440, TimeDelta::minutes(1)));
            added += 1;
        }
        day = day.succ_opt().unwrap();
    }
    rows
}

/// Hourly policy: 10-day domain test slice, 6+2 day trials with a one-day
/// gap, one-day episodes with a 5h gap.
pub fn hourly_policy() -> Arc<HierarchyPolicy> {
    Arc::new(
        HierarchyPolicy::new(
            60,
            DomainParams {
                test_period: DurationSpec::days(10),
                child_kind: NodeKind::Trial,
            },
            TrialParams {
                train_period: DurationSpec::days(6),
                test_period: DurationSpec::days(2),
                time_gap: DurationSpec::days(1),
                start_weekdays: WeekdaySet::all(),
                start_00: true,
            },
            EpisodeParams {
                sample_duration: DurationSpec::days(1),
                time_gap: DurationSpec::hours(5),
                start_weekdays: WeekdaySet::all(),
                start_00: false,
            },
            GenericParams::default(),
        )
        .unwrap(),
    )
}

/// Minute policy whose generic level draws one-day Mon-Thu samples.
pub fn weekday_minute_policy() -> Arc<HierarchyPolicy> {
    Arc::new(
        HierarchyPolicy::new(
            1,
            DomainParams::default(),
            TrialParams::default(),
            EpisodeParams::default(),
            GenericParams {
                sample_duration: DurationSpec::days(1),
                time_gap: DurationSpec::hours(5),
                start_weekdays: WeekdaySet::mon_to_thu(),
                start_00: false,
                test_period: DurationSpec::default(),
            },
        )
        .unwrap(),
    )
}
