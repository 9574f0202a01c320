//! Domain types shared by the telemetry store and its consumers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::error::{Result, TelemetryError};

/// Current wall-clock time as fractional seconds since the Unix epoch.
pub fn unix_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// One hardware telemetry reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    /// GPU temperature in °C
    pub gpu_temp: f64,
    /// CPU temperature in °C
    pub cpu_temp: f64,
    /// Fan speed in RPM
    pub fan_rpm: f64,
    /// Power draw in watts
    pub power_draw: f64,
}

impl TelemetrySample {
    pub fn new(timestamp: f64, gpu_temp: f64, cpu_temp: f64, fan_rpm: f64, power_draw: f64) -> Self {
        Self {
            timestamp,
            gpu_temp,
            cpu_temp,
            fan_rpm,
            power_draw,
        }
    }

    /// Rejects readings with non-finite fields.
    ///
    /// The store itself accepts anything; ingestion boundaries call this
    /// before handing a sample over.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("timestamp", self.timestamp),
            ("gpu_temp", self.gpu_temp),
            ("cpu_temp", self.cpu_temp),
            ("fan_rpm", self.fan_rpm),
            ("power_draw", self.power_draw),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(TelemetryError::InvalidSample(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Value of a metric on this sample.
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::GpuTemp => self.gpu_temp,
            Metric::CpuTemp => self.cpu_temp,
            Metric::FanRpm => self.fan_rpm,
            Metric::PowerDraw => self.power_draw,
        }
    }
}

/// The four measured quantities of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    GpuTemp,
    CpuTemp,
    FanRpm,
    PowerDraw,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::GpuTemp => "gpu_temp",
            Metric::CpuTemp => "cpu_temp",
            Metric::FanRpm => "fan_rpm",
            Metric::PowerDraw => "power_draw",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of power draw between two consecutive windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerTrend {
    Up,
    Down,
    #[default]
    Stable,
}

impl PowerTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            PowerTrend::Up => "up",
            PowerTrend::Down => "down",
            PowerTrend::Stable => "stable",
        }
    }
}

impl fmt::Display for PowerTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Windowed summary returned by the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub avg_gpu_temp: f64,
    pub avg_cpu_temp: f64,
    pub latest_fan_rpm: f64,
    pub power_trend: PowerTrend,
}

/// Per-metric outliers found in a window, each in window order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyReport {
    pub gpu_anomalies: Vec<TelemetrySample>,
    pub cpu_anomalies: Vec<TelemetrySample>,
    pub power_anomalies: Vec<TelemetrySample>,
}

impl AnomalyReport {
    /// Total flags across all metrics. A sample flagged for two metrics counts twice.
    pub fn total(&self) -> usize {
        self.gpu_anomalies.len() + self.cpu_anomalies.len() + self.power_anomalies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
