//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_adapter::{CsvAdapter, CsvOptions};
use crate::adapters::csv_feed_adapter::CsvFeedAdapter;
use crate::adapters::diagnostic_sinks::LogSink;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::{build_policy, data_settings, DataSettings};
use crate::domain::describe::DataSummary;
use crate::domain::error::EpisamplerError;
use crate::domain::node::DatasetNode;
use crate::domain::params::SampleType;
use crate::domain::policy::{HierarchyPolicy, NodeKind, SplitRule};
use crate::domain::row::Row;
use crate::domain::store::TimeSeriesStore;
use crate::ports::data_port::DataPort;
use crate::ports::feed_port::FeedPort;

#[derive(Parser, Debug)]
#[command(
    name = "episampler",
    about = "Hierarchical train/test episode sampler for time series"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sample trials and episodes and write each episode as a CSV file
    Sample {
        #[arg(short, long)]
        config: PathBuf,
        /// Data files, overriding `[data] files` (repeatable)
        #[arg(short, long)]
        data: Vec<String>,
        #[arg(long, default_value_t = 1)]
        trials: usize,
        /// Train episodes drawn per trial
        #[arg(long, default_value_t = 1)]
        episodes: usize,
        /// Test episodes drawn per trial
        #[arg(long, default_value_t = 0)]
        test_episodes: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 1.0)]
        alpha: f64,
        #[arg(long, default_value_t = 1.0)]
        beta: f64,
        #[arg(short, long, default_value = "episodes")]
        output: PathBuf,
    },
    /// Print summary statistics and the domain split of the configured data
    Describe {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Vec<String>,
    },
    /// Validate a configuration file and print the resolved sampling levels
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// How many samples to draw at each level of a `sample` run.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingPlan {
    pub trials: usize,
    pub episodes: usize,
    pub test_episodes: usize,
    pub alpha: f64,
    pub beta: f64,
}

/// Names of the datasets written during a `sample` run, in write order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SamplingReport {
    pub trials: Vec<String>,
    pub episodes: Vec<String>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Sample {
            config,
            data,
            trials,
            episodes,
            test_episodes,
            seed,
            alpha,
            beta,
            output,
        } => {
            let plan = SamplingPlan {
                trials,
                episodes,
                test_episodes,
                alpha,
                beta,
            };
            run_sample(&config, &data, &plan, seed, &output)
        }
        Command::Describe { config, data } => run_describe(&config, &data),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, EpisamplerError> {
    FileConfigAdapter::from_file(path).map_err(|e| EpisamplerError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Reads the configured data files, or `overrides` when any are given.
///
/// Configured file names resolve against the config file's directory;
/// overrides resolve against the working directory.
pub fn load_rows(
    config_path: &Path,
    settings: &DataSettings,
    overrides: &[String],
) -> Result<Vec<Row>, EpisamplerError> {
    let options = CsvOptions {
        delimiter: settings.delimiter,
        has_header: settings.has_header,
        timestamp_format: settings.timestamp_format.clone(),
    };
    let (base, sources) = if overrides.is_empty() {
        let base = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        (base, settings.files.clone())
    } else {
        (PathBuf::new(), overrides.to_vec())
    };
    CsvAdapter::new(base, options).fetch_all(&sources)
}

/// Draws trials from a ready domain and episodes from each trial, handing
/// every episode to `feed`.
///
/// When the domain's children are already episodes, the domain is sampled
/// directly with the plan's episode counts and `trials` is ignored.
pub fn sample_hierarchy<R: Rng + ?Sized>(
    domain: &mut DatasetNode,
    plan: &SamplingPlan,
    rng: &mut R,
    feed: &dyn FeedPort,
) -> Result<SamplingReport, EpisamplerError> {
    let mut report = SamplingReport::default();
    if domain.child_kind() == Some(NodeKind::Episode) {
        feed_episodes(domain, plan, rng, feed, &mut report)?;
        return Ok(report);
    }
    for _ in 0..plan.trials {
        let mut trial = domain.sample(SampleType::Train, plan.alpha, plan.beta, rng)?;
        log::info!("trial {} holds {} records", trial.name(), trial.row_count());
        trial.reset_loaded()?;
        feed_episodes(&mut trial, plan, rng, feed, &mut report)?;
        report.trials.push(trial.name().to_string());
    }
    Ok(report)
}

fn feed_episodes<R: Rng + ?Sized>(
    parent: &mut DatasetNode,
    plan: &SamplingPlan,
    rng: &mut R,
    feed: &dyn FeedPort,
    report: &mut SamplingReport,
) -> Result<(), EpisamplerError> {
    let draws = std::iter::repeat(SampleType::Train)
        .take(plan.episodes)
        .chain(std::iter::repeat(SampleType::Test).take(plan.test_episodes));
    for sample_type in draws {
        let episode = parent.sample(sample_type, plan.alpha, plan.beta, rng)?;
        episode.to_feed(feed)?;
        report.episodes.push(episode.name().to_string());
    }
    Ok(())
}

fn run_sample(
    config_path: &Path,
    data: &[String],
    plan: &SamplingPlan,
    seed: Option<u64>,
    output: &Path,
) -> Result<(), EpisamplerError> {
    log::info!("loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    let policy = build_policy(&config, &LogSink)?;
    let settings = data_settings(&config)?;
    let rows = load_rows(config_path, &settings, data)?;

    let mut domain = DatasetNode::domain(Arc::new(policy), Arc::new(LogSink));
    domain.reset(rows)?;
    log::info!(
        "domain ready: train {}, test {}",
        domain.train_interval().unwrap_or_default(),
        domain.test_interval().unwrap_or_default()
    );

    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let feed = CsvFeedAdapter::new(output.to_path_buf())
        .with_format(settings.delimiter, &settings.timestamp_format);

    let report = sample_hierarchy(&mut domain, plan, &mut rng, &feed)?;
    for name in &report.episodes {
        println!("{}", feed.path_for(name).display());
    }
    log::info!(
        "wrote {} episodes from {} trials to {}",
        report.episodes.len(),
        report.trials.len(),
        output.display()
    );
    Ok(())
}

fn run_describe(config_path: &Path, data: &[String]) -> Result<(), EpisamplerError> {
    let config = load_config(config_path)?;
    let policy = build_policy(&config, &LogSink)?;
    let settings = data_settings(&config)?;
    let store = TimeSeriesStore::load(load_rows(config_path, &settings, data)?, &LogSink)?;

    print!("{}", DataSummary::compute(store.rows()));
    if store.duplicates_removed() > 0 {
        println!("duplicates removed: {}", store.duplicates_removed());
    }
    match policy.partition(NodeKind::Domain, store.row_count()) {
        Ok(p) => println!("domain split: train {}, test {}", p.train, p.test),
        Err(e) => println!("domain split: {e}"),
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), EpisamplerError> {
    eprintln!("Validating config: {}", config_path.display());
    let config = load_config(config_path)?;
    let policy = build_policy(&config, &LogSink)?;
    let settings = data_settings(&config)?;

    println!("timeframe: {} minutes", policy.timeframe().num_minutes());
    if settings.files.is_empty() {
        println!("data files: none configured");
    } else {
        println!("data files: {}", settings.files.join(", "));
    }
    print!("{}", describe_levels(&policy));
    Ok(())
}

/// One block per sampling level, as printed by `validate`.
pub fn describe_levels(policy: &HierarchyPolicy) -> String {
    let mut out = String::new();
    for kind in [NodeKind::Domain, NodeKind::Trial, NodeKind::Generic] {
        let Some(level) = policy.level(kind) else {
            continue;
        };
        let split = match level.split {
            SplitRule::Duration { test_records } => {
                format!("last {} records held out for test", test_records)
            }
            SplitRule::Proportional {
                train_records,
                test_records,
            } => format!("train:test = {}:{}", train_records, test_records),
        };
        out.push_str(&format!(
            "[{}] -> {}\n  duration: {} ({} records)\n  max gap: {}\n  start weekdays: {}\n  start at 00:00: {}\n  split: {}\n",
            kind,
            level.child_kind,
            level.sample_duration,
            level.target_records,
            level.time_gap,
            level.start_weekdays,
            level.start_00,
            split
        ));
    }
    out
}
