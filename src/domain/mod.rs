//! Core domain types and the sampling engine.

pub mod row;
pub mod interval;
pub mod params;
pub mod store;
pub mod sampler;
pub mod policy;
pub mod node;
pub mod describe;
pub mod config;
pub mod diagnostic;
pub mod error;
