//! Periodic sample production.
//!
//! The scheduler inserts an initial burst synchronously, then spawns a tokio
//! task that appends one generated sample per period. The returned
//! [`ScheduledTask`] is the only way to stop it.

use crate::core::config::GeneratorConfig;
use crate::core::{Result, TelemetryError};
use crate::telemetry::buffer::RetentionBuffer;
use crate::telemetry::generator::SampleGenerator;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Shared handles the producer writes through.
#[derive(Clone)]
pub struct ProducerHandles {
    pub buffer: Arc<RwLock<RetentionBuffer>>,
    pub generator: Arc<Mutex<SampleGenerator>>,
}

/// Drives the initial burst and the periodic producer.
#[derive(Debug, Clone)]
pub struct Scheduler {
    initial_burst: usize,
    period: Duration,
}

impl Scheduler {
    pub fn new(initial_burst: usize, period: Duration) -> Self {
        Self {
            initial_burst,
            period,
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.initial_burst, config.interval)
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn initial_burst(&self) -> usize {
        self.initial_burst
    }

    /// Insert the initial burst and spawn the periodic producer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, handles: ProducerHandles) -> Result<ScheduledTask> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            TelemetryError::runtime(format!("cannot start generator outside a tokio runtime: {}", e))
        })?;

        let cancelled = Arc::new(AtomicBool::new(false));
        produce(&handles, &cancelled, self.initial_burst);
        tracing::debug!(count = self.initial_burst, "Inserted initial telemetry burst");

        let period = self.period;
        let task_handles = handles.clone();
        let task_cancelled = Arc::clone(&cancelled);
        let handle = runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !produce(&task_handles, &task_cancelled, 1) {
                    break;
                }
            }
        });

        Ok(ScheduledTask {
            handle,
            cancelled,
            buffer: handles.buffer,
            period,
        })
    }
}

/// Generate and insert `count` samples unless cancelled.
///
/// The cancellation flag is checked under the buffer write lock, so once
/// [`ScheduledTask::cancel`] returns no further sample can land.
fn produce(handles: &ProducerHandles, cancelled: &AtomicBool, count: usize) -> bool {
    let samples = handles.generator.lock().generate_batch(count);

    let mut buffer = handles.buffer.write();
    if cancelled.load(Ordering::Acquire) {
        return false;
    }
    for sample in samples {
        buffer.insert(sample);
    }
    tracing::trace!(count, size = buffer.len(), "Generated telemetry");
    true
}

/// Handle to the running periodic producer.
///
/// Cancels the producer when cancelled explicitly or dropped.
pub struct ScheduledTask {
    handle: JoinHandle<()>,
    cancelled: Arc<AtomicBool>,
    buffer: Arc<RwLock<RetentionBuffer>>,
    period: Duration,
}

impl ScheduledTask {
    /// Stop the producer. No sample is inserted after this returns.
    pub fn cancel(self) {
        drop(self);
    }

    /// True once the producer task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    fn stop(&self) {
        self.cancelled.store(true, Ordering::Release);
        // Wait out any insert already holding the lock
        drop(self.buffer.write());
        self.handle.abort();
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handles(capacity: usize) -> ProducerHandles {
        ProducerHandles {
            buffer: Arc::new(RwLock::new(RetentionBuffer::new(capacity))),
            generator: Arc::new(Mutex::new(SampleGenerator::seeded(7))),
        }
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        let scheduler = Scheduler::new(5, Duration::from_secs(2));
        let result = scheduler.start(handles(100));
        assert!(matches!(result, Err(TelemetryError::Runtime(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_periodic() {
        let scheduler = Scheduler::new(50, Duration::from_secs(2));
        let h = handles(1000);
        let task = scheduler.start(h.clone()).unwrap();

        assert_eq!(h.buffer.read().len(), 50);

        time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(h.buffer.read().len(), 51);

        time::sleep(Duration::from_secs(4)).await;
        assert_eq!(h.buffer.read().len(), 53);

        task.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_production() {
        let scheduler = Scheduler::new(3, Duration::from_secs(2));
        let h = handles(1000);
        let task = scheduler.start(h.clone()).unwrap();

        time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(h.buffer.read().len(), 4);

        task.cancel();
        time::sleep(Duration::from_secs(20)).await;
        assert_eq!(h.buffer.read().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let h = handles(1000);
        {
            let _task = Scheduler::new(0, Duration::from_secs(1)).start(h.clone()).unwrap();
        }

        time::sleep(Duration::from_secs(5)).await;
        assert!(h.buffer.read().is_empty());
    }
}
