//! Sampling parameter building blocks: durations, weekday sets and sample types.

use crate::domain::error::EpisamplerError;
use chrono::{TimeDelta, Weekday};
use std::fmt;

/// Wall-clock duration expressed the way configuration files state it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DurationSpec {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
}

impl DurationSpec {
    pub const fn new(days: u32, hours: u32, minutes: u32) -> Self {
        Self {
            days,
            hours,
            minutes,
        }
    }

    pub const fn days(days: u32) -> Self {
        Self::new(days, 0, 0)
    }

    pub const fn hours(hours: u32) -> Self {
        Self::new(0, hours, 0)
    }

    pub fn to_delta(self) -> TimeDelta {
        TimeDelta::days(self.days as i64)
            + TimeDelta::hours(self.hours as i64)
            + TimeDelta::minutes(self.minutes as i64)
    }

    pub fn is_zero(self) -> bool {
        self.days == 0 && self.hours == 0 && self.minutes == 0
    }

    /// Unit-wise sum, `None` when any unit overflows.
    pub fn checked_add(self, rhs: DurationSpec) -> Option<DurationSpec> {
        Some(DurationSpec::new(
            self.days.checked_add(rhs.days)?,
            self.hours.checked_add(rhs.hours)?,
            self.minutes.checked_add(rhs.minutes)?,
        ))
    }
}

impl fmt::Display for DurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
    }
}

/// Maximum number of whole records of period `timeframe` fitting in `duration`.
pub fn records_floor(duration: TimeDelta, timeframe: TimeDelta) -> usize {
    let period = timeframe.num_seconds();
    if period <= 0 {
        return 0;
    }
    (duration.num_seconds().max(0) / period) as usize
}

/// Number of records of period `timeframe` in `duration`, rounded to nearest.
pub fn records_round(duration: TimeDelta, timeframe: TimeDelta) -> usize {
    let period = timeframe.num_seconds();
    if period <= 0 {
        return 0;
    }
    (duration.num_seconds().max(0) as f64 / period as f64).round() as usize
}

/// Set of calendar weekdays, Monday = 0 through Sunday = 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdaySet {
    mask: u8,
}

impl WeekdaySet {
    pub const fn all() -> Self {
        Self { mask: 0b0111_1111 }
    }

    pub const fn none() -> Self {
        Self { mask: 0 }
    }

    /// Monday through Thursday.
    pub const fn mon_to_thu() -> Self {
        Self { mask: 0b0000_1111 }
    }

    /// Monday through Friday.
    pub const fn mon_to_fri() -> Self {
        Self { mask: 0b0001_1111 }
    }

    pub fn from_indices(indices: &[u32]) -> Result<Self, EpisamplerError> {
        let mut mask = 0u8;
        for &i in indices {
            if i > 6 {
                return Err(EpisamplerError::invalid_parameter(
                    "start_weekdays",
                    format!("weekday index {} out of range 0..=6", i),
                ));
            }
            mask |= 1 << i;
        }
        Ok(Self { mask })
    }

    pub fn from_weekdays(days: &[Weekday]) -> Self {
        let mask = days
            .iter()
            .fold(0u8, |acc, d| acc | (1 << d.num_days_from_monday()));
        Self { mask }
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.mask & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    pub fn indices(&self) -> Vec<u32> {
        (0..7).filter(|i| self.mask & (1 << i) != 0).collect()
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.indices().iter().map(|i| i.to_string()).collect();
        write!(f, "{{{}}}", parts.join(","))
    }
}

/// Which subset a sample is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleType {
    Train,
    Test,
    Random,
}

impl SampleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleType::Train => "train",
            SampleType::Test => "test",
            SampleType::Random => "random",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SampleType {
    type Err = EpisamplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "train" | "0" => Ok(SampleType::Train),
            "test" | "1" => Ok(SampleType::Test),
            other => Err(EpisamplerError::invalid_parameter(
                "sample_type",
                format!("expected train or test, got {}", other),
            )),
        }
    }
}
