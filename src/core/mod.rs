//! Core domain types, configuration and errors.
//!
//! Everything else in the crate builds on the types defined here.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder};
pub use error::{Result, TelemetryError};
pub use types::{unix_now, AggregateStats, AnomalyReport, Metric, PowerTrend, TelemetrySample};
