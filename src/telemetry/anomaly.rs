//! Fixed-window z-score anomaly detection.
//!
//! Each metric is judged against the population mean and standard deviation
//! of the same window it is drawn from. This is a heuristic, not a
//! statistically rigorous test.

use crate::core::{AnomalyReport, Metric, TelemetrySample};

/// Deviation, in standard deviations, beyond which a value is anomalous.
pub const ANOMALY_THRESHOLD: f64 = 2.0;

/// Population mean and standard deviation of one metric over a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSummary {
    pub mean: f64,
    pub std_dev: f64,
}

impl MetricSummary {
    /// Summarise `metric` over `window`. `None` for an empty window.
    pub fn of(window: &[TelemetrySample], metric: Metric) -> Option<Self> {
        if window.is_empty() {
            return None;
        }

        let n = window.len() as f64;
        let mean = window.iter().map(|s| s.metric(metric)).sum::<f64>() / n;
        let variance = window
            .iter()
            .map(|s| (s.metric(metric) - mean).powi(2))
            .sum::<f64>()
            / n;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// Strictly more than `threshold` deviations from the mean.
    ///
    /// Never true when the deviation is zero.
    pub fn is_outlier(&self, value: f64, threshold: f64) -> bool {
        if self.std_dev == 0.0 {
            return false;
        }
        (value - self.mean).abs() > threshold * self.std_dev
    }
}

/// Z-score detector over gpu temperature, cpu temperature and power draw.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    threshold: f64,
}

impl AnomalyDetector {
    /// Create a detector with the given threshold.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Flag outliers per metric, preserving window order.
    pub fn detect(&self, window: &[TelemetrySample]) -> AnomalyReport {
        AnomalyReport {
            gpu_anomalies: self.outliers(window, Metric::GpuTemp),
            cpu_anomalies: self.outliers(window, Metric::CpuTemp),
            power_anomalies: self.outliers(window, Metric::PowerDraw),
        }
    }

    /// Samples whose `metric` is an outlier within `window`.
    pub fn outliers(&self, window: &[TelemetrySample], metric: Metric) -> Vec<TelemetrySample> {
        let Some(summary) = MetricSummary::of(window, metric) else {
            return Vec::new();
        };

        window
            .iter()
            .filter(|s| summary.is_outlier(s.metric(metric), self.threshold))
            .copied()
            .collect()
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(ANOMALY_THRESHOLD)
    }
}
