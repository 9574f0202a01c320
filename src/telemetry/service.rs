//! The telemetry service: one owner for the buffer, generator and schedule.
//!
//! The host constructs a single [`TelemetryService`] and shares it with
//! consumers through an `Arc`.

use crate::core::{AggregateStats, AnomalyReport, Config, Result, TelemetrySample};
use crate::telemetry::aggregator::Aggregator;
use crate::telemetry::anomaly::AnomalyDetector;
use crate::telemetry::buffer::RetentionBuffer;
use crate::telemetry::generator::SampleGenerator;
use crate::telemetry::scheduler::{ProducerHandles, ScheduledTask, Scheduler};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// In-memory telemetry store with periodic synthetic generation.
pub struct TelemetryService {
    buffer: Arc<RwLock<RetentionBuffer>>,
    generator: Arc<Mutex<SampleGenerator>>,
    scheduler: Scheduler,
    task: Mutex<Option<ScheduledTask>>,
    detector: AnomalyDetector,
    config: Config,
}

impl TelemetryService {
    /// Create a service with an empty buffer. Nothing runs until [`init`](Self::init).
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            buffer: Arc::new(RwLock::new(RetentionBuffer::new(config.retention.capacity))),
            generator: Arc::new(Mutex::new(SampleGenerator::from_seed(config.generator.seed))),
            scheduler: Scheduler::from_config(&config.generator),
            task: Mutex::new(None),
            detector: AnomalyDetector::default(),
            config,
        })
    }

    /// Ensure the periodic generator is running.
    ///
    /// Returns `true` if this call started it. Calling again while it runs
    /// leaves the schedule and the buffer untouched.
    pub fn init(&self) -> Result<bool> {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            tracing::debug!("Telemetry generator already running");
            return Ok(false);
        }

        let started = self.scheduler.start(ProducerHandles {
            buffer: Arc::clone(&self.buffer),
            generator: Arc::clone(&self.generator),
        })?;
        *task = Some(started);

        tracing::info!(
            burst = self.scheduler.initial_burst(),
            period_ms = self.scheduler.period().as_millis() as u64,
            "Telemetry generator started"
        );
        Ok(true)
    }

    /// Stop the periodic generator. Returns `false` if it was not running.
    ///
    /// Buffered samples are kept.
    pub fn destroy(&self) -> bool {
        match self.task.lock().take() {
            Some(task) => {
                task.cancel();
                tracing::info!("Telemetry generator stopped");
                true
            },
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Insert a reading from outside the generator.
    pub fn insert_telemetry(&self, sample: TelemetrySample) {
        let evicted = self.buffer.write().insert(sample);
        if evicted > 0 {
            tracing::trace!(evicted, "Evicted oldest telemetry");
        }
    }

    /// Samples from the last `seconds`, newest-first.
    pub fn get_telemetry_since(&self, seconds: f64) -> Vec<TelemetrySample> {
        self.buffer.read().since(seconds)
    }

    /// The `limit` newest samples.
    pub fn get_latest_telemetry(&self, limit: usize) -> Vec<TelemetrySample> {
        self.buffer.read().latest(limit)
    }

    pub fn get_telemetry_stats(&self, seconds: f64) -> AggregateStats {
        Aggregator::new(&self.buffer.read()).stats(seconds)
    }

    pub fn detect_anomalies(&self, seconds: f64) -> AnomalyReport {
        let window = self.get_telemetry_since(seconds);
        self.detector.detect(&window)
    }

    pub fn len(&self) -> usize {
        self.buffer.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.buffer.read().capacity()
    }

    /// Drop all buffered samples. The generator keeps running.
    pub fn clear(&self) {
        self.buffer.write().clear();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn detector(&self) -> &AnomalyDetector {
        &self.detector
    }
}

impl Drop for TelemetryService {
    fn drop(&mut self) {
        self.destroy();
    }
}
