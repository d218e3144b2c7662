//! CSV feed sink: one file per sampled dataset.

use crate::domain::error::EpisamplerError;
use crate::domain::row::{FIELD_NAMES, Row};
use crate::ports::feed_port::FeedPort;
use std::fs;
use std::path::PathBuf;

/// Writes each dataset to `<dir>/<name>.csv` in the layout [`CsvAdapter`]
/// reads back.
///
/// [`CsvAdapter`]: crate::adapters::csv_adapter::CsvAdapter
pub struct CsvFeedAdapter {
    dir: PathBuf,
    delimiter: u8,
    timestamp_format: String,
}

impl CsvFeedAdapter {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            delimiter: b';',
            timestamp_format: "%Y%m%d %H%M%S".into(),
        }
    }

    pub fn with_format(mut self, delimiter: u8, timestamp_format: &str) -> Self {
        self.delimiter = delimiter;
        self.timestamp_format = timestamp_format.to_string();
        self
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

impl FeedPort for CsvFeedAdapter {
    fn write(&self, name: &str, rows: &[Row]) -> Result<(), EpisamplerError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);
        let csv_err = |e: csv::Error| EpisamplerError::DataUnavailable {
            reason: format!("failed to write {}: {}", path.display(), e),
        };

        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_path(&path)
            .map_err(csv_err)?;

        let mut header = vec!["datetime"];
        header.extend(FIELD_NAMES);
        wtr.write_record(&header).map_err(csv_err)?;

        for row in rows {
            let mut record = vec![row.timestamp.format(&self.timestamp_format).to_string()];
            record.extend(row.fields().iter().map(|v| v.to_string()));
            wtr.write_record(&record).map_err(csv_err)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::csv_adapter::{CsvAdapter, CsvOptions};
    use crate::ports::data_port::DataPort;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn rows() -> Vec<Row> {
        let start = NaiveDate::from_ymd_opt(2024, 2, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..3)
            .map(|i| Row {
                timestamp: start + chrono::TimeDelta::minutes(i),
                open: 1.0 + i as f64,
                high: 2.0 + i as f64,
                low: 0.5,
                close: 1.25,
                volume: 100.0,
            })
            .collect()
    }

    #[test]
    fn writes_named_file_with_header() {
        let dir = TempDir::new().unwrap();
        let feed = CsvFeedAdapter::new(dir.path().join("out"));
        feed.write("train_episode_2024-02-05T00-00", &rows()).unwrap();

        let path = feed.path_for("train_episode_2024-02-05T00-00");
        let content = fs::read_to_string(path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("datetime;open;high;low;close;volume"));
        assert_eq!(lines.next(), Some("20240205 000000;1;2;0.5;1.25;100"));
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn output_reads_back_through_csv_adapter() {
        let dir = TempDir::new().unwrap();
        let feed = CsvFeedAdapter::new(dir.path().to_path_buf());
        feed.write("episode", &rows()).unwrap();

        let adapter = CsvAdapter::new(dir.path().to_path_buf(), CsvOptions::default());
        assert_eq!(adapter.fetch_rows("episode.csv").unwrap(), rows());
    }
}
