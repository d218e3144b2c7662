//! Builds a validated [`HierarchyPolicy`] and data settings from a [`ConfigPort`].
//!
//! Sections: `[data]`, `[domain]`, `[trial]`, `[episode]`, `[generic]`.
//! Durations are spread over `<name>_days`, `<name>_hours` and
//! `<name>_minutes`; when any of the three is present the missing ones count
//! as zero, otherwise the level default applies.

use crate::domain::diagnostic::Diagnostic;
use crate::domain::error::EpisamplerError;
use crate::domain::params::{DurationSpec, WeekdaySet};
use crate::domain::policy::{
    DomainParams, EpisodeParams, GenericParams, HierarchyPolicy, NodeKind, TrialParams,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::diagnostic_port::DiagnosticSink;

const UNITS: [&str; 3] = ["days", "hours", "minutes"];

const DATA_KEYS: &[&str] = &["files", "delimiter", "has_header", "timestamp_format", "timeframe"];
const DOMAIN_KEYS: &[&str] = &["test_period", "child_kind"];
const TRIAL_KEYS: &[&str] = &[
    "train_period",
    "test_period",
    "time_gap",
    "start_weekdays",
    "start_00",
];
const EPISODE_KEYS: &[&str] = &["sample_duration", "time_gap", "start_weekdays", "start_00"];
const GENERIC_KEYS: &[&str] = &[
    "sample_duration",
    "time_gap",
    "start_weekdays",
    "start_00",
    "test_period",
];

/// Older names of `sample_duration`, still accepted with a warning.
const DEPRECATED_DURATION_NAMES: [&str; 2] = ["episode_len", "episode_duration"];

/// Where to find the source rows and how they are laid out.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub files: Vec<String>,
    pub delimiter: u8,
    pub has_header: bool,
    pub timestamp_format: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            delimiter: b';',
            has_header: true,
            timestamp_format: "%Y%m%d %H%M%S".into(),
        }
    }
}

pub fn build_policy(
    config: &dyn ConfigPort,
    sink: &dyn DiagnosticSink,
) -> Result<HierarchyPolicy, EpisamplerError> {
    report_unrecognized_keys(config, sink);

    let timeframe = read_u32(config, "data", "timeframe")?.unwrap_or(1);

    let domain_defaults = DomainParams::default();
    let domain = DomainParams {
        test_period: read_duration(config, "domain", "test_period", domain_defaults.test_period)?,
        child_kind: match config.get_string("domain", "child_kind") {
            Some(s) => s
                .parse::<NodeKind>()
                .map_err(|e| EpisamplerError::config_invalid("domain", "child_kind", e.to_string()))?,
            None => domain_defaults.child_kind,
        },
    };

    let t = TrialParams::default();
    let trial = TrialParams {
        train_period: read_duration(config, "trial", "train_period", t.train_period)?,
        test_period: read_duration(config, "trial", "test_period", t.test_period)?,
        time_gap: read_duration(config, "trial", "time_gap", t.time_gap)?,
        start_weekdays: read_weekdays(config, "trial", t.start_weekdays)?,
        start_00: read_bool(config, "trial", "start_00", t.start_00)?,
    };

    let e = EpisodeParams::default();
    let episode = EpisodeParams {
        sample_duration: read_sample_duration(config, "episode", e.sample_duration)?,
        time_gap: read_duration(config, "episode", "time_gap", e.time_gap)?,
        start_weekdays: read_weekdays(config, "episode", e.start_weekdays)?,
        start_00: read_bool(config, "episode", "start_00", e.start_00)?,
    };

    let g = GenericParams::default();
    let generic = GenericParams {
        sample_duration: read_sample_duration(config, "generic", g.sample_duration)?,
        time_gap: read_duration(config, "generic", "time_gap", g.time_gap)?,
        start_weekdays: read_weekdays(config, "generic", g.start_weekdays)?,
        start_00: read_bool(config, "generic", "start_00", g.start_00)?,
        test_period: read_duration(config, "generic", "test_period", g.test_period)?,
    };

    HierarchyPolicy::new(timeframe, domain, trial, episode, generic)
}

pub fn data_settings(config: &dyn ConfigPort) -> Result<DataSettings, EpisamplerError> {
    let defaults = DataSettings::default();
    let files = config
        .get_string("data", "files")
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    let delimiter = match config.get_string("data", "delimiter") {
        Some(s) => parse_delimiter(&s)?,
        None => defaults.delimiter,
    };
    let timestamp_format = config
        .get_string("data", "timestamp_format")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(defaults.timestamp_format);

    Ok(DataSettings {
        files,
        delimiter,
        has_header: read_bool(config, "data", "has_header", defaults.has_header)?,
        timestamp_format,
    })
}

fn known_keys(section: &str) -> Option<&'static [&'static str]> {
    match section {
        "data" => Some(DATA_KEYS),
        "domain" => Some(DOMAIN_KEYS),
        "trial" => Some(TRIAL_KEYS),
        "episode" => Some(EPISODE_KEYS),
        "generic" => Some(GENERIC_KEYS),
        _ => None,
    }
}

fn is_duration_key(names: &[&str], key: &str) -> bool {
    UNITS.iter().any(|unit| {
        key.strip_suffix(unit)
            .and_then(|stem| stem.strip_suffix('_'))
            .is_some_and(|stem| names.contains(&stem))
    })
}

fn report_unrecognized_keys(config: &dyn ConfigPort, sink: &dyn DiagnosticSink) {
    for section in config.sections() {
        let known = known_keys(&section);
        for key in config.keys(&section) {
            let Some(known) = known else {
                sink.emit(Diagnostic::UnknownConfigKey {
                    section: section.clone(),
                    key,
                });
                continue;
            };
            if known.contains(&key.as_str()) || is_duration_key(known, &key) {
                continue;
            }
            if known.contains(&"sample_duration") && is_duration_key(&DEPRECATED_DURATION_NAMES, &key)
            {
                let unit = key.rsplit('_').next().unwrap_or_default();
                sink.emit(Diagnostic::DeprecatedConfigKey {
                    section: section.clone(),
                    replacement: format!("sample_duration_{}", unit),
                    key,
                });
                continue;
            }
            sink.emit(Diagnostic::UnknownConfigKey {
                section: section.clone(),
                key,
            });
        }
    }
}

fn read_u32(config: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<u32>, EpisamplerError> {
    config
        .get_string(section, key)
        .map(|s| {
            s.trim().parse::<u32>().map_err(|_| {
                EpisamplerError::config_invalid(
                    section,
                    key,
                    format!("expected a non-negative integer, got '{}'", s),
                )
            })
        })
        .transpose()
}

fn read_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, EpisamplerError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(EpisamplerError::config_invalid(
                section,
                key,
                format!("expected true/false, got '{}'", s),
            )),
        },
    }
}

/// Reads `<name>_{days,hours,minutes}`, trying `aliases` for units the
/// canonical name does not set.
fn read_duration_with_aliases(
    config: &dyn ConfigPort,
    section: &str,
    name: &str,
    aliases: &[&str],
    default: DurationSpec,
) -> Result<DurationSpec, EpisamplerError> {
    let mut values = [None; 3];
    for (slot, unit) in values.iter_mut().zip(UNITS) {
        for stem in std::iter::once(&name).chain(aliases) {
            let key = format!("{}_{}", stem, unit);
            if let Some(v) = read_u32(config, section, &key)? {
                *slot = Some(v);
                break;
            }
        }
    }
    if values.iter().all(Option::is_none) {
        return Ok(default);
    }
    let [days, hours, minutes] = values.map(|v| v.unwrap_or(0));
    Ok(DurationSpec::new(days, hours, minutes))
}

fn read_duration(
    config: &dyn ConfigPort,
    section: &str,
    name: &str,
    default: DurationSpec,
) -> Result<DurationSpec, EpisamplerError> {
    read_duration_with_aliases(config, section, name, &[], default)
}

fn read_sample_duration(
    config: &dyn ConfigPort,
    section: &str,
    default: DurationSpec,
) -> Result<DurationSpec, EpisamplerError> {
    read_duration_with_aliases(
        config,
        section,
        "sample_duration",
        &DEPRECATED_DURATION_NAMES,
        default,
    )
}

fn read_weekdays(
    config: &dyn ConfigPort,
    section: &str,
    default: WeekdaySet,
) -> Result<WeekdaySet, EpisamplerError> {
    let Some(raw) = config.get_string(section, "start_weekdays") else {
        return Ok(default);
    };
    let invalid = |reason: String| EpisamplerError::config_invalid(section, "start_weekdays", reason);

    let indices = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u32>()
                .map_err(|_| invalid(format!("'{}' is not a weekday number (0 = Monday)", s)))
        })
        .collect::<Result<Vec<u32>, _>>()?;
    if indices.is_empty() {
        return Err(invalid("at least one weekday is required".into()));
    }
    WeekdaySet::from_indices(&indices).map_err(|e| invalid(e.to_string()))
}

fn parse_delimiter(value: &str) -> Result<u8, EpisamplerError> {
    let trimmed = value.trim();
    match trimmed.to_lowercase().as_str() {
        "semicolon" => return Ok(b';'),
        "comma" => return Ok(b','),
        "tab" | "\\t" => return Ok(b'\t'),
        "pipe" => return Ok(b'|'),
        "space" => return Ok(b' '),
        _ => {}
    }
    match trimmed.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(EpisamplerError::config_invalid(
            "data",
            "delimiter",
            format!("expected a single ASCII character or a name like 'comma', got '{}'", value),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::diagnostic_sinks::{MemorySink, NullSink};
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::policy::SplitRule;
    use chrono::TimeDelta;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn empty_config_yields_default_policy() {
        let config = make_config("");
        let policy = build_policy(&config, &NullSink).unwrap();
        let expected = HierarchyPolicy::new(
            1,
            DomainParams::default(),
            TrialParams::default(),
            EpisodeParams::default(),
            GenericParams::default(),
        )
        .unwrap();
        assert_eq!(policy, expected);
    }

    #[test]
    fn durations_and_weekdays_are_read() {
        let config = make_config(
            r#"
[data]
timeframe = 60

[domain]
test_period_days = 10

[trial]
train_period_days = 6
test_period_days = 2
time_gap_days = 1
start_weekdays = 0, 2
start_00 = false

[episode]
sample_duration_hours = 12
time_gap_hours = 2
"#,
        );
        let policy = build_policy(&config, &NullSink).unwrap();
        assert_eq!(policy.timeframe(), TimeDelta::hours(1));

        let domain = policy.level(NodeKind::Domain).unwrap();
        assert_eq!(domain.sample_duration, DurationSpec::days(8));
        assert_eq!(domain.split, SplitRule::Duration { test_records: 240 });
        assert_eq!(domain.start_weekdays.indices(), vec![0, 2]);
        assert!(!domain.start_00);

        let trial = policy.level(NodeKind::Trial).unwrap();
        assert_eq!(trial.sample_duration, DurationSpec::hours(12));
        assert_eq!(trial.target_records, 12);
        assert_eq!(trial.time_gap, DurationSpec::hours(2));
    }

    #[test]
    fn partial_duration_zeroes_missing_units() {
        let config = make_config("[episode]\nsample_duration_minutes = 90\n");
        let policy = build_policy(&config, &NullSink).unwrap();
        let trial = policy.level(NodeKind::Trial).unwrap();
        assert_eq!(trial.sample_duration, DurationSpec::new(0, 0, 90));
    }

    #[test]
    fn deprecated_duration_keys_are_remapped_with_warning() {
        let sink = MemorySink::new();
        let config = make_config("[episode]\nepisode_len_days = 1\nepisode_duration_hours = 2\n");
        let policy = build_policy(&config, &sink).unwrap();

        let trial = policy.level(NodeKind::Trial).unwrap();
        assert_eq!(trial.sample_duration, DurationSpec::new(1, 2, 0));
        let warnings = sink.warnings();
        assert!(warnings.contains(&Diagnostic::DeprecatedConfigKey {
            section: "episode".into(),
            key: "episode_len_days".into(),
            replacement: "sample_duration_days".into(),
        }));
        assert!(warnings.contains(&Diagnostic::DeprecatedConfigKey {
            section: "episode".into(),
            key: "episode_duration_hours".into(),
            replacement: "sample_duration_hours".into(),
        }));
    }

    #[test]
    fn canonical_key_wins_over_deprecated_alias() {
        let config = make_config("[generic]\nsample_duration_hours = 3\nepisode_len_hours = 9\n");
        let policy = build_policy(&config, &NullSink).unwrap();
        let generic = policy.level(NodeKind::Generic).unwrap();
        assert_eq!(generic.sample_duration, DurationSpec::hours(3));
    }

    #[test]
    fn unknown_keys_and_sections_warn_but_do_not_fail() {
        let sink = MemorySink::new();
        let config = make_config("[trial]\ncolour = red\n[backtest]\ninitial_capital = 5\n");
        build_policy(&config, &sink).unwrap();
        let warnings = sink.warnings();
        assert!(warnings.contains(&Diagnostic::UnknownConfigKey {
            section: "trial".into(),
            key: "colour".into(),
        }));
        assert!(warnings.contains(&Diagnostic::UnknownConfigKey {
            section: "backtest".into(),
            key: "initial_capital".into(),
        }));
    }

    #[test]
    fn deprecated_names_are_unknown_outside_sampling_levels() {
        let sink = MemorySink::new();
        let config = make_config("[trial]\nepisode_len_days = 1\n");
        build_policy(&config, &sink).unwrap();
        assert!(matches!(
            sink.warnings().as_slice(),
            [Diagnostic::UnknownConfigKey { key, .. }] if key == "episode_len_days"
        ));
    }

    #[test]
    fn non_numeric_duration_fails() {
        let config = make_config("[trial]\ntrain_period_days = thirty\n");
        let err = build_policy(&config, &NullSink).unwrap_err();
        assert!(
            matches!(err, EpisamplerError::ConfigInvalid { key, .. } if key == "train_period_days")
        );
    }

    #[test]
    fn weekday_out_of_range_fails() {
        let config = make_config("[episode]\nstart_weekdays = 0,7\n");
        let err = build_policy(&config, &NullSink).unwrap_err();
        assert!(
            matches!(err, EpisamplerError::ConfigInvalid { section, key, .. } if section == "episode" && key == "start_weekdays")
        );
    }

    #[test]
    fn empty_weekday_list_fails() {
        let config = make_config("[generic]\nstart_weekdays =\n");
        let err = build_policy(&config, &NullSink).unwrap_err();
        assert!(matches!(err, EpisamplerError::ConfigInvalid { key, .. } if key == "start_weekdays"));
    }

    #[test]
    fn invalid_bool_fails() {
        let config = make_config("[trial]\nstart_00 = maybe\n");
        let err = build_policy(&config, &NullSink).unwrap_err();
        assert!(matches!(err, EpisamplerError::ConfigInvalid { key, .. } if key == "start_00"));
    }

    #[test]
    fn child_kind_is_parsed() {
        let config = make_config("[domain]\nchild_kind = generic\n");
        let policy = build_policy(&config, &NullSink).unwrap();
        assert_eq!(policy.child_kind(NodeKind::Domain), Some(NodeKind::Generic));

        let config = make_config("[domain]\nchild_kind = universe\n");
        let err = build_policy(&config, &NullSink).unwrap_err();
        assert!(matches!(err, EpisamplerError::ConfigInvalid { key, .. } if key == "child_kind"));
    }

    #[test]
    fn policy_errors_surface_after_parsing() {
        let config = make_config("[data]\ntimeframe = 0\n");
        let err = build_policy(&config, &NullSink).unwrap_err();
        assert!(matches!(err, EpisamplerError::InvalidParameter { name, .. } if name == "timeframe"));
    }

    #[test]
    fn huge_trial_period_is_rejected_not_wrapped() {
        let config = make_config(
            "[trial]\ntrain_period_days = 4294967295\ntest_period_days = 1\n",
        );
        let err = build_policy(&config, &NullSink).unwrap_err();
        assert!(matches!(err, EpisamplerError::InvalidParameter { name, .. } if name == "train_period"));
    }

    #[test]
    fn data_settings_defaults() {
        let settings = data_settings(&make_config("")).unwrap();
        assert_eq!(settings, DataSettings::default());
    }

    #[test]
    fn data_settings_reads_files_and_layout() {
        let config = make_config(
            "[data]\nfiles = a.csv, b.csv ,\ndelimiter = comma\nhas_header = no\ntimestamp_format = %Y-%m-%d %H:%M\n",
        );
        let settings = data_settings(&config).unwrap();
        assert_eq!(settings.files, vec!["a.csv", "b.csv"]);
        assert_eq!(settings.delimiter, b',');
        assert!(!settings.has_header);
        assert_eq!(settings.timestamp_format, "%Y-%m-%d %H:%M");
    }

    #[test]
    fn bad_delimiter_fails() {
        let config = make_config("[data]\ndelimiter = ::\n");
        let err = data_settings(&config).unwrap_err();
        assert!(matches!(err, EpisamplerError::ConfigInvalid { key, .. } if key == "delimiter"));
    }
}
