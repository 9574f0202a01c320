//! In-memory telemetry store.
//!
//! Control flow: the scheduler asks the generator for samples and inserts
//! them into the retention buffer. The aggregator and the anomaly detector
//! only read from the buffer.

pub mod aggregator;
pub mod anomaly;
pub mod buffer;
pub mod generator;
pub mod scheduler;
pub mod service;

pub use aggregator::{classify_trend, Aggregator, TREND_THRESHOLD_WATTS};
pub use anomaly::{AnomalyDetector, MetricSummary, ANOMALY_THRESHOLD};
pub use buffer::RetentionBuffer;
pub use generator::SampleGenerator;
pub use scheduler::{ScheduledTask, Scheduler};
pub use service::TelemetryService;
