//! Feed sink port trait.

use crate::domain::error::EpisamplerError;
use crate::domain::row::Row;

/// Port for handing sampled rows to a downstream consumer.
pub trait FeedPort {
    fn write(&self, name: &str, rows: &[Row]) -> Result<(), EpisamplerError>;
}
