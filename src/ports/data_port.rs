//! Tabular source port trait.

use crate::domain::error::EpisamplerError;
use crate::domain::row::Row;

pub trait DataPort {
    /// Rows of one source, in the order the source stores them.
    fn fetch_rows(&self, source: &str) -> Result<Vec<Row>, EpisamplerError>;

    /// Default implementation: concatenates sources in the given order.
    fn fetch_all(&self, sources: &[String]) -> Result<Vec<Row>, EpisamplerError> {
        if sources.is_empty() {
            return Err(EpisamplerError::DataUnavailable {
                reason: "no data source specified".into(),
            });
        }
        let mut rows = Vec::new();
        for source in sources {
            rows.extend(self.fetch_rows(source)?);
        }
        Ok(rows)
    }
}
