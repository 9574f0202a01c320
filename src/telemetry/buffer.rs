//! Capacity-bounded retention buffer.
//!
//! Samples are kept newest-first in a `VecDeque`, so prepending and evicting
//! from the tail are both O(1).

use crate::core::{unix_now, TelemetrySample};
use std::collections::VecDeque;

/// Newest-first store of telemetry samples with a fixed capacity.
#[derive(Debug, Clone)]
pub struct RetentionBuffer {
    samples: VecDeque<TelemetrySample>,
    capacity: usize,
}

impl RetentionBuffer {
    /// Create an empty buffer holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");

        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend a sample and evict from the tail down to capacity.
    ///
    /// Returns the number of evicted samples.
    pub fn insert(&mut self, sample: TelemetrySample) -> usize {
        self.samples.push_front(sample);

        let evicted = self.samples.len().saturating_sub(self.capacity);
        if evicted > 0 {
            self.samples.truncate(self.capacity);
        }
        evicted
    }

    /// Samples from the last `seconds`, newest-first.
    pub fn since(&self, seconds: f64) -> Vec<TelemetrySample> {
        self.since_at(unix_now() - seconds)
    }

    /// Samples with `timestamp >= cutoff`, newest-first.
    pub fn since_at(&self, cutoff: f64) -> Vec<TelemetrySample> {
        self.samples
            .iter()
            .filter(|s| s.timestamp >= cutoff)
            .copied()
            .collect()
    }

    /// Samples with `start <= timestamp < end`, newest-first.
    pub fn between(&self, start: f64, end: f64) -> Vec<TelemetrySample> {
        self.samples
            .iter()
            .filter(|s| s.timestamp >= start && s.timestamp < end)
            .copied()
            .collect()
    }

    /// The `n` newest samples.
    pub fn latest(&self, n: usize) -> Vec<TelemetrySample> {
        self.samples.iter().take(n).copied().collect()
    }

    /// Iterate newest-first without copying.
    pub fn iter(&self) -> impl Iterator<Item = &TelemetrySample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every sample. Only called on explicit request.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: f64) -> TelemetrySample {
        TelemetrySample::new(ts, 50.0, 60.0, 1300.0, 120.0)
    }

    #[test]
    fn test_buffer_creation() {
        let buffer = RetentionBuffer::new(8);

        assert_eq!(buffer.capacity(), 8);
        assert_eq!(buffer.len(), 0);
        assert!(buffer.is_empty());
        assert!(buffer.latest(5).is_empty());
        assert!(buffer.since(3600.0).is_empty());
    }

    #[test]
    #[should_panic(expected = "Capacity must be greater than 0")]
    fn test_zero_capacity_panics() {
        RetentionBuffer::new(0);
    }

    #[test]
    fn test_insert_prepends() {
        let mut buffer = RetentionBuffer::new(4);
        buffer.insert(sample(1.0));
        buffer.insert(sample(2.0));
        buffer.insert(sample(3.0));

        let timestamps: Vec<f64> = buffer.iter().map(|s| s.timestamp).collect();
        assert_eq!(timestamps, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_eviction_keeps_most_recent() {
        let mut buffer = RetentionBuffer::new(1000);

        for i in 0..1500 {
            let evicted = buffer.insert(sample(i as f64));
            assert!(buffer.len() <= 1000);
            assert_eq!(evicted, usize::from(i >= 1000));
        }

        assert_eq!(buffer.len(), 1000);
        let timestamps: Vec<f64> = buffer.iter().map(|s| s.timestamp).collect();
        let expected: Vec<f64> = (500..1500).rev().map(|i| i as f64).collect();
        assert_eq!(timestamps, expected);
    }

    #[test]
    fn test_latest() {
        let mut buffer = RetentionBuffer::new(10);
        for i in 0..5 {
            buffer.insert(sample(i as f64));
        }

        let latest = buffer.latest(2);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].timestamp, 4.0);
        assert_eq!(latest[1].timestamp, 3.0);

        // Asking for more than stored returns everything
        assert_eq!(buffer.latest(50).len(), 5);
        assert!(buffer.latest(0).is_empty());
    }

    #[test]
    fn test_since_at_and_between() {
        let mut buffer = RetentionBuffer::new(10);
        for ts in [10.0, 20.0, 30.0, 40.0] {
            buffer.insert(sample(ts));
        }

        let recent: Vec<f64> = buffer.since_at(25.0).iter().map(|s| s.timestamp).collect();
        assert_eq!(recent, vec![40.0, 30.0]);

        // Half-open: start included, end excluded
        let older: Vec<f64> = buffer.between(10.0, 30.0).iter().map(|s| s.timestamp).collect();
        assert_eq!(older, vec![20.0, 10.0]);
    }

    #[test]
    fn test_since_filters_out_of_order_injections() {
        let mut buffer = RetentionBuffer::new(10);
        let now = unix_now();
        buffer.insert(sample(now - 10.0));
        buffer.insert(sample(now - 5000.0));
        buffer.insert(sample(now - 1.0));

        let window = buffer.since(60.0);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].timestamp, now - 1.0);
        assert_eq!(window[1].timestamp, now - 10.0);
    }

    #[test]
    fn test_degenerate_windows() {
        let mut buffer = RetentionBuffer::new(10);
        buffer.insert(sample(unix_now()));

        assert!(buffer.since(-3600.0).is_empty());
        assert!(buffer.since(f64::NAN).is_empty());
        assert_eq!(buffer.since(f64::INFINITY).len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut buffer = RetentionBuffer::new(4);
        buffer.insert(sample(1.0));
        buffer.insert(sample(2.0));

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 4);
    }
}
