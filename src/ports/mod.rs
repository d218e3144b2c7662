//! Port traits the sampling core depends on.

pub mod config_port;
pub mod data_port;
pub mod diagnostic_port;
pub mod feed_port;
