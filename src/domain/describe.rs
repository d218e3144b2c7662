//! Descriptive statistics over a row slice.

use crate::domain::row::{FIELD_NAMES, Row};
use chrono::{NaiveDateTime, TimeDelta};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: &'static str,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator); NaN below two rows.
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSummary {
    pub rows: usize,
    pub first: Option<NaiveDateTime>,
    pub last: Option<NaiveDateTime>,
    pub span: TimeDelta,
    pub columns: Vec<ColumnSummary>,
}

impl DataSummary {
    pub fn compute(rows: &[Row]) -> Self {
        let first = rows.first().map(|r| r.timestamp);
        let last = rows.last().map(|r| r.timestamp);
        let span = match (first, last) {
            (Some(a), Some(b)) => b - a,
            _ => TimeDelta::zero(),
        };

        let columns = FIELD_NAMES
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let values: Vec<f64> = rows.iter().map(|r| r.fields()[i]).collect();
                summarize(name, values)
            })
            .collect();

        Self {
            rows: rows.len(),
            first,
            last,
            span,
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.name == name)
    }
}

fn summarize(name: &'static str, mut values: Vec<f64>) -> ColumnSummary {
    let n = values.len();
    if n == 0 {
        return ColumnSummary {
            name,
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            p25: f64::NAN,
            p50: f64::NAN,
            p75: f64::NAN,
            max: f64::NAN,
        };
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n < 2 {
        f64::NAN
    } else {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    };

    values.sort_by(|a, b| a.total_cmp(b));
    ColumnSummary {
        name,
        count: n,
        mean,
        std,
        min: values[0],
        p25: quantile(&values, 0.25),
        p50: quantile(&values, 0.5),
        p75: quantile(&values, 0.75),
        max: values[n - 1],
    }
}

/// Linear interpolation between the closest ranks of a sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

impl fmt::Display for DataSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first, self.last) {
            (Some(first), Some(last)) => writeln!(
                f,
                "{} rows from {} to {} ({} minutes)",
                self.rows,
                first,
                last,
                self.span.num_minutes()
            )?,
            _ => writeln!(f, "0 rows")?,
        }
        write!(f, "{:<6}", "")?;
        for c in &self.columns {
            write!(f, "{:>14}", c.name)?;
        }
        writeln!(f)?;

        let stats: [(&str, fn(&ColumnSummary) -> f64); 8] = [
            ("count", |c| c.count as f64),
            ("mean", |c| c.mean),
            ("std", |c| c.std),
            ("min", |c| c.min),
            ("25%", |c| c.p25),
            ("50%", |c| c.p50),
            ("75%", |c| c.p75),
            ("max", |c| c.max),
        ];
        for (label, get) in stats {
            write!(f, "{:<6}", label)?;
            for c in &self.columns {
                write!(f, "{:>14.6}", get(c))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn rows(closes: &[f64]) -> Vec<Row> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Row {
                timestamp: start + TimeDelta::minutes(i as i64),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 10.0,
            })
            .collect()
    }

    #[test]
    fn summary_matches_hand_computed_values() {
        let summary = DataSummary::compute(&rows(&[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(summary.rows, 4);
        assert_eq!(summary.span, TimeDelta::minutes(3));

        let close = summary.column("close").unwrap();
        assert_eq!(close.count, 4);
        assert_relative_eq!(close.mean, 2.5);
        assert_relative_eq!(close.std, 1.2909944487358056, epsilon = 1e-12);
        assert_relative_eq!(close.min, 1.0);
        assert_relative_eq!(close.p25, 1.75);
        assert_relative_eq!(close.p50, 2.5);
        assert_relative_eq!(close.p75, 3.25);
        assert_relative_eq!(close.max, 4.0);

        let high = summary.column("high").unwrap();
        assert_relative_eq!(high.mean, 3.5);
        let volume = summary.column("volume").unwrap();
        assert_relative_eq!(volume.std, 0.0);
    }

    #[test]
    fn unsorted_values_are_ranked() {
        let summary = DataSummary::compute(&rows(&[5.0, 1.0, 3.0]));
        let close = summary.column("close").unwrap();
        assert_relative_eq!(close.min, 1.0);
        assert_relative_eq!(close.p50, 3.0);
        assert_relative_eq!(close.max, 5.0);
    }

    #[test]
    fn single_row_has_undefined_std() {
        let summary = DataSummary::compute(&rows(&[7.0]));
        let close = summary.column("close").unwrap();
        assert!(close.std.is_nan());
        assert_relative_eq!(close.p75, 7.0);
    }

    #[test]
    fn empty_slice() {
        let summary = DataSummary::compute(&[]);
        assert_eq!(summary.rows, 0);
        assert!(summary.first.is_none());
        assert_eq!(summary.columns.len(), FIELD_NAMES.len());
        assert!(summary.to_string().starts_with("0 rows"));
    }

    #[test]
    fn display_lists_every_statistic() {
        let text = DataSummary::compute(&rows(&[1.0, 2.0])).to_string();
        for label in ["count", "mean", "std", "min", "25%", "50%", "75%", "max"] {
            assert!(text.contains(label), "missing {label}");
        }
        assert!(text.contains("close"));
    }
}
