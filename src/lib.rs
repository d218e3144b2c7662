//! episampler: episode sampling over ordered time-series data.
//!
//! Hexagonal architecture: sampling engine in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`], command line in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
