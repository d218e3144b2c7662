//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_feed_adapter;
pub mod diagnostic_sinks;
pub mod file_config_adapter;
