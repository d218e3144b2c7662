//! HierarchyPolicy: per-level sampling parameters and train/test partitioning.
//!
//! Domain and Generic nodes split their rows by wall-clock test duration, so
//! fixed-size Trials tile across history. Trial nodes split proportionally by
//! configured record counts, so every Trial yields the same train/test ratio
//! regardless of calendar density.

use crate::domain::error::EpisamplerError;
use crate::domain::interval::RowInterval;
use crate::domain::params::{records_floor, records_round, DurationSpec, WeekdaySet};
use chrono::TimeDelta;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Domain,
    Trial,
    Episode,
    Generic,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Domain => "domain",
            NodeKind::Trial => "trial",
            NodeKind::Episode => "episode",
            NodeKind::Generic => "generic",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = EpisamplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "domain" => Ok(NodeKind::Domain),
            "trial" => Ok(NodeKind::Trial),
            "episode" => Ok(NodeKind::Episode),
            "generic" => Ok(NodeKind::Generic),
            other => Err(EpisamplerError::invalid_parameter(
                "child_kind",
                format!("unknown node kind {}", other),
            )),
        }
    }
}

/// How a level places its train/test boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitRule {
    /// Test slice holds exactly `test_records` rows at the end of the data.
    Duration { test_records: usize },
    /// Rows split by the ratio of the two counts, one row left between them.
    Proportional {
        train_records: usize,
        test_records: usize,
    },
}

/// Resolved parameters a node uses to draw its children.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelParams {
    pub sample_duration: DurationSpec,
    pub time_gap: DurationSpec,
    pub start_weekdays: WeekdaySet,
    pub start_00: bool,
    pub split: SplitRule,
    pub sample_name: String,
    pub child_kind: NodeKind,
    pub target_records: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Partition {
    pub train: RowInterval,
    pub test: RowInterval,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainParams {
    pub test_period: DurationSpec,
    pub child_kind: NodeKind,
}

impl Default for DomainParams {
    fn default() -> Self {
        Self {
            test_period: DurationSpec::default(),
            child_kind: NodeKind::Trial,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialParams {
    pub train_period: DurationSpec,
    pub test_period: DurationSpec,
    pub time_gap: DurationSpec,
    pub start_weekdays: WeekdaySet,
    pub start_00: bool,
}

impl Default for TrialParams {
    fn default() -> Self {
        Self {
            train_period: DurationSpec::days(30),
            test_period: DurationSpec::days(2),
            time_gap: DurationSpec::days(15),
            start_weekdays: WeekdaySet::all(),
            start_00: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeParams {
    pub sample_duration: DurationSpec,
    pub time_gap: DurationSpec,
    pub start_weekdays: WeekdaySet,
    pub start_00: bool,
}

impl Default for EpisodeParams {
    fn default() -> Self {
        Self {
            sample_duration: DurationSpec::new(1, 23, 55),
            time_gap: DurationSpec::hours(5),
            start_weekdays: WeekdaySet::mon_to_fri(),
            start_00: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenericParams {
    pub sample_duration: DurationSpec,
    pub time_gap: DurationSpec,
    pub start_weekdays: WeekdaySet,
    pub start_00: bool,
    pub test_period: DurationSpec,
}

impl Default for GenericParams {
    fn default() -> Self {
        Self {
            sample_duration: DurationSpec::new(1, 23, 55),
            time_gap: DurationSpec::hours(5),
            start_weekdays: WeekdaySet::mon_to_thu(),
            start_00: false,
            test_period: DurationSpec::default(),
        }
    }
}

/// Immutable sampling configuration for a whole hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyPolicy {
    timeframe: TimeDelta,
    domain: LevelParams,
    trial: LevelParams,
    generic: LevelParams,
}

impl HierarchyPolicy {
    pub fn new(
        timeframe_minutes: u32,
        domain: DomainParams,
        trial: TrialParams,
        episode: EpisodeParams,
        generic: GenericParams,
    ) -> Result<Self, EpisamplerError> {
        if timeframe_minutes == 0 {
            return Err(EpisamplerError::invalid_parameter(
                "timeframe",
                "sampling period must be at least one minute",
            ));
        }
        if domain.child_kind == NodeKind::Domain {
            return Err(EpisamplerError::invalid_parameter(
                "child_kind",
                "a domain cannot produce domain samples",
            ));
        }
        let timeframe = TimeDelta::minutes(timeframe_minutes as i64);

        let trial_duration = trial
            .train_period
            .checked_add(trial.test_period)
            .ok_or_else(|| {
                EpisamplerError::invalid_parameter(
                    "train_period",
                    format!(
                        "trial duration {} + {} is out of range",
                        trial.train_period, trial.test_period
                    ),
                )
            })?;
        let domain_level = LevelParams {
            sample_duration: trial_duration,
            time_gap: trial.time_gap,
            start_weekdays: trial.start_weekdays,
            start_00: trial.start_00,
            split: SplitRule::Duration {
                test_records: records_round(domain.test_period.to_delta(), timeframe),
            },
            sample_name: sample_name(domain.child_kind).into(),
            child_kind: domain.child_kind,
            target_records: records_floor(trial_duration.to_delta(), timeframe),
        };

        let trial_level = LevelParams {
            sample_duration: episode.sample_duration,
            time_gap: episode.time_gap,
            start_weekdays: episode.start_weekdays,
            start_00: episode.start_00,
            split: SplitRule::Proportional {
                train_records: records_round(trial.train_period.to_delta(), timeframe),
                test_records: records_round(trial.test_period.to_delta(), timeframe),
            },
            sample_name: sample_name(NodeKind::Episode).into(),
            child_kind: NodeKind::Episode,
            target_records: records_floor(episode.sample_duration.to_delta(), timeframe),
        };

        let generic_level = LevelParams {
            sample_duration: generic.sample_duration,
            time_gap: generic.time_gap,
            start_weekdays: generic.start_weekdays,
            start_00: generic.start_00,
            split: SplitRule::Duration {
                test_records: records_round(generic.test_period.to_delta(), timeframe),
            },
            sample_name: sample_name(NodeKind::Generic).into(),
            child_kind: NodeKind::Generic,
            target_records: records_floor(generic.sample_duration.to_delta(), timeframe),
        };

        for (section, level) in [
            ("trial", &domain_level),
            ("episode", &trial_level),
            ("generic", &generic_level),
        ] {
            check_level(section, level)?;
        }
        if let SplitRule::Proportional { train_records: 0, .. } = trial_level.split {
            return Err(EpisamplerError::invalid_parameter(
                "train_period",
                "trial train period must cover at least one record",
            ));
        }

        Ok(Self {
            timeframe,
            domain: domain_level,
            trial: trial_level,
            generic: generic_level,
        })
    }

    /// Fixed sampling period of the source data.
    pub fn timeframe(&self) -> TimeDelta {
        self.timeframe
    }

    /// Parameters a node of `kind` uses for its children; `None` for leaves.
    pub fn level(&self, kind: NodeKind) -> Option<&LevelParams> {
        match kind {
            NodeKind::Domain => Some(&self.domain),
            NodeKind::Trial => Some(&self.trial),
            NodeKind::Generic => Some(&self.generic),
            NodeKind::Episode => None,
        }
    }

    pub fn child_kind(&self, kind: NodeKind) -> Option<NodeKind> {
        self.level(kind).map(|l| l.child_kind)
    }

    /// Computes train/test intervals for `rows` rows held by a node of `kind`.
    pub fn partition(&self, kind: NodeKind, rows: usize) -> Result<Partition, EpisamplerError> {
        let level = self.level(kind).ok_or_else(|| {
            EpisamplerError::invalid_parameter(
                "child_kind",
                format!("{} nodes are leaves and cannot be sampled", kind),
            )
        })?;

        let (partition, expects_test) = match level.split {
            SplitRule::Duration { test_records } => {
                let breakpoint = rows.saturating_sub(test_records);
                (
                    Partition {
                        train: RowInterval::new(0, breakpoint),
                        test: RowInterval::new(breakpoint, rows),
                    },
                    test_records > 0,
                )
            }
            SplitRule::Proportional {
                train_records,
                test_records,
            } => {
                let ratio = train_records as f64 / (train_records + test_records) as f64;
                let breakpoint = ((rows as f64 * ratio).round() as usize).min(rows);
                let test = if test_records == 0 {
                    RowInterval::empty_at(rows)
                } else {
                    RowInterval::new((breakpoint + 1).min(rows), rows)
                };
                (
                    Partition {
                        train: RowInterval::new(0, breakpoint),
                        test,
                    },
                    test_records > 0,
                )
            }
        };

        let minimum = level.target_records;
        if partition.train.len() < minimum {
            return Err(EpisamplerError::InsufficientData {
                interval: "train".into(),
                rows: partition.train.len(),
                minimum,
            });
        }
        if expects_test && partition.test.len() < minimum {
            return Err(EpisamplerError::InsufficientData {
                interval: "test".into(),
                rows: partition.test.len(),
                minimum,
            });
        }
        Ok(partition)
    }
}

fn check_level(section: &str, level: &LevelParams) -> Result<(), EpisamplerError> {
    if level.target_records == 0 {
        return Err(EpisamplerError::invalid_parameter(
            section,
            format!(
                "sample duration {} is shorter than one record",
                level.sample_duration
            ),
        ));
    }
    if level.start_weekdays.is_empty() {
        return Err(EpisamplerError::invalid_parameter(
            section,
            "start_weekdays must permit at least one weekday",
        ));
    }
    Ok(())
}

/// Name stem of samples of `kind`.
fn sample_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Domain => "domain_",
        NodeKind::Trial => "trial_",
        NodeKind::Episode => "episode_",
        NodeKind::Generic => "sample_",
    }
}
