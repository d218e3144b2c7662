//! IntervalSampler: retry-bounded random search for a contiguous sub-range.
//!
//! A candidate start row is drawn inside the interval at a Beta-distributed
//! fraction of its free width. The candidate must start on a permitted
//! weekday, optionally snaps to the first row of its day, and must not span
//! more wall-clock time than the target duration plus the gap tolerance.
//! All rejections share one attempt counter bounded by [`MAX_ATTEMPTS`].

use crate::domain::diagnostic::{Diagnostic, Rejection};
use crate::domain::error::EpisamplerError;
use crate::domain::interval::RowInterval;
use crate::domain::params::WeekdaySet;
use crate::domain::store::TimeSeriesStore;
use crate::ports::diagnostic_port::DiagnosticSink;
use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta};
use rand::Rng;
use rand_distr::{Beta, Distribution};

pub const MAX_ATTEMPTS: usize = 100;

#[derive(Debug, Clone)]
pub struct SampleRequest {
    pub interval: RowInterval,
    pub target_records: usize,
    pub target_duration: TimeDelta,
    pub max_gap: TimeDelta,
    pub start_weekdays: WeekdaySet,
    pub start_00: bool,
    pub alpha: f64,
    pub beta: f64,
    /// The accepted sample is named prefix, anchor time, suffix.
    pub name_prefix: String,
    pub name_suffix: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampledRange {
    pub rows: RowInterval,
    pub anchor: NaiveDateTime,
    pub name: String,
    pub attempts: usize,
    pub gap: TimeDelta,
}

pub struct IntervalSampler<'a> {
    store: &'a TimeSeriesStore,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> IntervalSampler<'a> {
    pub fn new(store: &'a TimeSeriesStore, sink: &'a dyn DiagnosticSink) -> Self {
        Self { store, sink }
    }

    pub fn sample<R: Rng + ?Sized>(
        &self,
        request: &SampleRequest,
        rng: &mut R,
    ) -> Result<SampledRange, EpisamplerError> {
        let fraction = beta_distribution(request.alpha, request.beta)?;
        self.check_interval(request)?;

        let rows = self.store.rows();
        let interval = request.interval;
        let room = interval.len() - request.target_records;
        let mut weekday_rejections = 0;
        let mut gap_rejections = 0;

        for attempt in 1..=MAX_ATTEMPTS {
            let draw: f64 = fraction.sample(rng);
            let offset = ((room as f64 * draw) as usize).min(room - 1);
            let drawn = interval.start + offset;
            let drawn_ts = rows[drawn].timestamp;

            if !request.start_weekdays.contains(drawn_ts.weekday()) {
                weekday_rejections += 1;
                self.sink.emit(Diagnostic::CandidateRejected {
                    attempt,
                    reason: Rejection::Weekday,
                    start: drawn_ts,
                });
                continue;
            }

            let first = if request.start_00 {
                self.day_start(drawn)
            } else {
                drawn
            };
            let last = first + request.target_records;
            let anchor = rows[first].timestamp;
            let gap = (rows[last - 1].timestamp - anchor) - request.target_duration;

            if gap < request.max_gap {
                let sampled = SampledRange {
                    rows: RowInterval::new(first, last),
                    anchor,
                    name: format!(
                        "{}{}{}",
                        request.name_prefix,
                        anchor.format("%Y-%m-%dT%H-%M"),
                        request.name_suffix
                    ),
                    attempts: attempt,
                    gap,
                };
                self.sink.emit(Diagnostic::SampleAccepted {
                    name: sampled.name.clone(),
                    rows: sampled.rows,
                    attempts: attempt,
                    gap,
                });
                return Ok(sampled);
            }

            gap_rejections += 1;
            self.sink.emit(Diagnostic::CandidateRejected {
                attempt,
                reason: Rejection::Gap,
                start: anchor,
            });
        }

        self.sink.emit(Diagnostic::SamplingExhausted {
            attempts: MAX_ATTEMPTS,
            interval,
        });
        Err(EpisamplerError::SamplingExhausted {
            attempts: MAX_ATTEMPTS,
            start: interval.start,
            end: interval.end,
            target_records: request.target_records,
            weekday_rejections,
            gap_rejections,
        })
    }

    fn check_interval(&self, request: &SampleRequest) -> Result<(), EpisamplerError> {
        let rows = self.store.row_count();
        let interval = request.interval;
        if request.target_records == 0
            || interval.end > rows
            || interval.len() <= request.target_records
        {
            return Err(EpisamplerError::InvalidInterval {
                start: interval.start,
                end: interval.end,
                target_records: request.target_records,
                rows,
            });
        }
        Ok(())
    }

    /// First row at or after midnight of the day `drawn` falls on.
    fn day_start(&self, drawn: usize) -> usize {
        let rows = self.store.rows();
        let midnight = rows[drawn].timestamp.date().and_time(NaiveTime::MIN);
        let nearest = self.store.nearest_index(midnight);
        if rows[nearest].timestamp < midnight {
            nearest + 1
        } else {
            nearest
        }
    }
}

fn beta_distribution(alpha: f64, beta: f64) -> Result<Beta<f64>, EpisamplerError> {
    for (name, value) in [("b_alpha", alpha), ("b_beta", beta)] {
        if !(value.is_finite() && value > 0.0) {
            return Err(EpisamplerError::invalid_parameter(
                name,
                format!("expected positive Beta-distribution parameter, got {}", value),
            ));
        }
    }
    Beta::new(alpha, beta).map_err(|e| EpisamplerError::invalid_parameter("b_alpha", e.to_string()))
}
