//! thermo-telemetry - client-side hardware telemetry buffer.
//!
//! Keeps a bounded, newest-first buffer of GPU/CPU temperature, fan speed and
//! power readings, fed by a synthetic generator or by external streamers, and
//! answers window queries, aggregate statistics and z-score anomaly checks.
//!
//! # Features
//!
//! - **Bounded retention**: at most 1000 samples, oldest evicted first
//! - **Periodic generation**: initial burst then one sample per interval
//! - **Aggregation**: window averages and power trend
//! - **Anomaly detection**: population stddev outliers per metric
//! - **Tools and HTTP API**: JSON queries for chat and automation clients
//!
//! # Architecture
//!
//! - `core`: configuration, errors and the sample data model
//! - `telemetry`: buffer, generator, scheduler, aggregator, detector, service
//! - `analysis`: health, performance and anomaly digests
//! - `tools`: named query tools with JSON schemas
//! - `export`: CSV and JSON rendering
//! - `api`: axum HTTP server
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use thermo_telemetry::core::Config;
//! use thermo_telemetry::telemetry::TelemetryService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = TelemetryService::new(Config::default())?;
//!     service.init()?;
//!     let stats = service.get_telemetry_stats(60.0);
//!     println!("GPU avg: {:.1}", stats.avg_gpu_temp);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod analysis;
pub mod api;
pub mod cli;
pub mod core;
pub mod export;
pub mod telemetry;
pub mod tools;

// Re-export core types for convenience
pub use crate::core::{Config, Result};
pub use crate::telemetry::TelemetryService;
