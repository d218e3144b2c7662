//! CSV file data adapter.

use crate::domain::error::EpisamplerError;
use crate::domain::row::Row;
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use std::fs::File;
use std::path::PathBuf;

/// Layout of the CSV files a [`CsvAdapter`] reads.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub has_header: bool,
    pub timestamp_format: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            has_header: true,
            timestamp_format: "%Y%m%d %H%M%S".into(),
        }
    }
}

/// Reads `datetime, open, high, low, close[, volume]` rows from CSV files.
///
/// Relative source names resolve against `base_path`; absolute ones are used
/// as given.
pub struct CsvAdapter {
    base_path: PathBuf,
    options: CsvOptions,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf, options: CsvOptions) -> Self {
        Self { base_path, options }
    }

    fn csv_path(&self, source: &str) -> PathBuf {
        self.base_path.join(source)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_rows(&self, source: &str) -> Result<Vec<Row>, EpisamplerError> {
        let path = self.csv_path(source);
        let file = File::open(&path).map_err(|e| EpisamplerError::DataUnavailable {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.options.delimiter)
            .has_headers(self.options.has_header)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut rows = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| EpisamplerError::DataUnavailable {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }

            let ts_str = record.get(0).ok_or_else(|| EpisamplerError::DataUnavailable {
                reason: format!("missing datetime column at record {}", line + 1),
            })?;
            let timestamp = NaiveDateTime::parse_from_str(ts_str, &self.options.timestamp_format)
                .map_err(|e| EpisamplerError::DataUnavailable {
                    reason: format!(
                        "invalid datetime '{}' at record {} (expected {}): {}",
                        ts_str,
                        line + 1,
                        self.options.timestamp_format,
                        e
                    ),
                })?;

            let volume = match record.get(5) {
                Some(v) if !v.is_empty() => parse_field(v, "volume", line)?,
                _ => 0.0,
            };

            rows.push(Row {
                timestamp,
                open: required_field(&record, 1, "open", line)?,
                high: required_field(&record, 2, "high", line)?,
                low: required_field(&record, 3, "low", line)?,
                close: required_field(&record, 4, "close", line)?,
                volume,
            });
        }

        Ok(rows)
    }
}

fn required_field(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<f64, EpisamplerError> {
    let value = record
        .get(index)
        .ok_or_else(|| EpisamplerError::DataUnavailable {
            reason: format!("missing {} column at record {}", name, line + 1),
        })?;
    parse_field(value, name, line)
}

fn parse_field(value: &str, name: &str, line: usize) -> Result<f64, EpisamplerError> {
    value
        .parse()
        .map_err(|e| EpisamplerError::DataUnavailable {
            reason: format!("invalid {} value '{}' at record {}: {}", name, value, line + 1, e),
        })
}
