//! Health checks, performance analysis and anomaly digests.
//!
//! These are consumers of the telemetry service: everything here is derived
//! from the query interface, never from the buffer directly.

use crate::core::{AggregateStats, AnomalyReport, Result, TelemetryError, TelemetrySample};
use crate::telemetry::aggregator::mean;
use crate::telemetry::TelemetryService;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;

/// Number of readings listed in the chat prompt context.
const PROMPT_RECENT_READINGS: usize = 5;

/// Temperature assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermalStatus {
    Excellent,
    Good,
    /// A single reading above the comfortable range
    Warning,
    /// A window average above the comfortable range
    Concerning,
}

impl ThermalStatus {
    /// Status of a single reading.
    pub fn for_reading(temp: f64) -> Self {
        if temp < 70.0 {
            Self::Excellent
        } else if temp < 80.0 {
            Self::Good
        } else {
            Self::Warning
        }
    }

    /// Status of a window average.
    pub fn for_average(temp: f64) -> Self {
        match Self::for_reading(temp) {
            Self::Warning => Self::Concerning,
            status => status,
        }
    }
}

/// Fan activity assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoolingStatus {
    Active,
    Moderate,
    Low,
}

impl CoolingStatus {
    pub fn for_rpm(rpm: f64) -> Self {
        if rpm > 1500.0 {
            Self::Active
        } else if rpm > 1000.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

/// Power draw assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerStatus {
    Efficient,
    Moderate,
    High,
}

impl PowerStatus {
    pub fn for_draw(watts: f64) -> Self {
        if watts < 150.0 {
            Self::Efficient
        } else if watts < 200.0 {
            Self::Moderate
        } else {
            Self::High
        }
    }
}

/// Short label shown next to live temperatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TemperatureLabel {
    Cool,
    Normal,
    Hot,
}

impl TemperatureLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cool => "Cool",
            Self::Normal => "Normal",
            Self::Hot => "Hot",
        }
    }

    pub fn for_temp(temp: f64) -> Self {
        if temp < 50.0 {
            Self::Cool
        } else if temp < 70.0 {
            Self::Normal
        } else {
            Self::Hot
        }
    }
}

impl std::fmt::Display for TemperatureLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Health status
// ---------------------------------------------------------------------------

/// Point-in-time health built from the newest sample.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub overall: OverallHealth,
    pub components: ComponentHealth,
    pub anomalies: RecentAnomalies,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    Healthy,
    NeedsAttention,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub gpu: TemperatureReading,
    pub cpu: TemperatureReading,
    pub cooling: FanReading,
    pub power: PowerReading,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemperatureReading {
    pub temperature: f64,
    pub status: ThermalStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FanReading {
    pub fan_rpm: f64,
    pub status: CoolingStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct PowerReading {
    pub draw: f64,
    pub status: PowerStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentAnomalies {
    pub recent: usize,
    pub status: AnomalyPresence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyPresence {
    None,
    Detected,
}

/// Health of the newest reading plus anomalies over `window_secs`.
pub fn health_status(service: &TelemetryService, window_secs: f64) -> Result<HealthStatus> {
    let latest = service
        .get_latest_telemetry(1)
        .into_iter()
        .next()
        .ok_or(TelemetryError::NoData)?;
    let recent = service.detect_anomalies(window_secs).total();

    let components = ComponentHealth {
        gpu: TemperatureReading {
            temperature: latest.gpu_temp,
            status: ThermalStatus::for_reading(latest.gpu_temp),
        },
        cpu: TemperatureReading {
            temperature: latest.cpu_temp,
            status: ThermalStatus::for_reading(latest.cpu_temp),
        },
        cooling: FanReading {
            fan_rpm: latest.fan_rpm,
            status: CoolingStatus::for_rpm(latest.fan_rpm),
        },
        power: PowerReading {
            draw: latest.power_draw,
            status: PowerStatus::for_draw(latest.power_draw),
        },
    };

    let degraded = components.gpu.status == ThermalStatus::Warning
        || components.cpu.status == ThermalStatus::Warning
        || components.power.status == PowerStatus::High;

    Ok(HealthStatus {
        overall: if degraded {
            OverallHealth::NeedsAttention
        } else {
            OverallHealth::Healthy
        },
        components,
        anomalies: RecentAnomalies {
            recent,
            status: if recent == 0 {
                AnomalyPresence::None
            } else {
                AnomalyPresence::Detected
            },
        },
        timestamp: Utc::now(),
    })
}

// ---------------------------------------------------------------------------
// Performance analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceAnalysis {
    pub thermal_performance: ThermalPerformance,
    pub power_efficiency: PowerEfficiency,
    pub cooling_performance: CoolingPerformance,
    pub stability: Stability,
    pub overall_score: u8,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermalPerformance {
    pub gpu_temp: ThermalAssessment,
    pub cpu_temp: ThermalAssessment,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThermalAssessment {
    pub current: f64,
    pub average: f64,
    pub status: ThermalStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct PowerEfficiency {
    pub current: f64,
    pub average: f64,
    pub status: PowerStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoolingPerformance {
    pub current: f64,
    pub status: CoolingStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stability {
    pub anomaly_count: usize,
    pub status: StabilityStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StabilityStatus {
    Stable,
    Unstable,
}

/// Analyse the last `seconds` of telemetry.
pub fn analyze_performance(service: &TelemetryService, seconds: f64) -> PerformanceAnalysis {
    let window = service.get_telemetry_since(seconds);
    let stats = service.get_telemetry_stats(seconds);
    let anomaly_count = service.detect_anomalies(seconds).total();
    let newest = window.first();
    let current = |field: fn(&TelemetrySample) -> f64| newest.map_or(0.0, field);

    let avg_power = mean(&window, |s| s.power_draw);

    let mut analysis = PerformanceAnalysis {
        thermal_performance: ThermalPerformance {
            gpu_temp: ThermalAssessment {
                current: current(|s| s.gpu_temp),
                average: stats.avg_gpu_temp,
                status: ThermalStatus::for_average(stats.avg_gpu_temp),
            },
            cpu_temp: ThermalAssessment {
                current: current(|s| s.cpu_temp),
                average: stats.avg_cpu_temp,
                status: ThermalStatus::for_average(stats.avg_cpu_temp),
            },
        },
        power_efficiency: PowerEfficiency {
            current: current(|s| s.power_draw),
            average: avg_power,
            status: PowerStatus::for_draw(avg_power),
        },
        cooling_performance: CoolingPerformance {
            current: stats.latest_fan_rpm,
            status: CoolingStatus::for_rpm(stats.latest_fan_rpm),
        },
        stability: Stability {
            anomaly_count,
            status: if anomaly_count == 0 {
                StabilityStatus::Stable
            } else {
                StabilityStatus::Unstable
            },
        },
        overall_score: 0,
        insights: Vec::new(),
    };

    analysis.overall_score = overall_score(&analysis);
    analysis.insights = insights(&analysis);
    analysis
}

/// 100 minus penalties for warm averages, heavy power and instability.
pub fn overall_score(analysis: &PerformanceAnalysis) -> u8 {
    let thermal_penalty = |status: ThermalStatus| match status {
        ThermalStatus::Concerning | ThermalStatus::Warning => 20,
        ThermalStatus::Good => 10,
        ThermalStatus::Excellent => 0,
    };

    let mut penalty = thermal_penalty(analysis.thermal_performance.gpu_temp.status)
        + thermal_penalty(analysis.thermal_performance.cpu_temp.status);

    penalty += match analysis.power_efficiency.status {
        PowerStatus::High => 15,
        PowerStatus::Moderate => 5,
        PowerStatus::Efficient => 0,
    };

    if analysis.stability.status == StabilityStatus::Unstable {
        penalty += 25;
    }

    100u8.saturating_sub(penalty)
}

fn insights(analysis: &PerformanceAnalysis) -> Vec<String> {
    let mut insights = Vec::new();
    let thermal = &analysis.thermal_performance;

    if thermal.gpu_temp.status == ThermalStatus::Excellent
        && thermal.cpu_temp.status == ThermalStatus::Excellent
    {
        insights.push(
            "Excellent thermal performance - both GPU and CPU temperatures are optimal".to_string(),
        );
    }
    if analysis.power_efficiency.status == PowerStatus::Efficient {
        insights.push("Power consumption is efficient for current workload".to_string());
    }
    if analysis.cooling_performance.status == CoolingStatus::Active {
        insights.push("Cooling system is actively maintaining optimal temperatures".to_string());
    }
    if analysis.stability.status == StabilityStatus::Stable {
        insights.push("System is running stably with no anomalies detected".to_string());
    }

    insights
}

// ---------------------------------------------------------------------------
// Anomaly digest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationKind {
    GpuTemperature,
    CpuTemperature,
    PowerDraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestHealth {
    Excellent,
    NeedsAttention,
}

/// Anomalies, stats and recommendations for one window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyDigest {
    pub time_window: String,
    pub total_anomalies: usize,
    pub anomalies: AnomalyReport,
    pub statistics: AggregateStats,
    pub recommendations: Vec<Recommendation>,
    pub overall_health: DigestHealth,
}

pub fn anomaly_digest(service: &TelemetryService, seconds: f64) -> AnomalyDigest {
    let anomalies = service.detect_anomalies(seconds);
    let statistics = service.get_telemetry_stats(seconds);
    let recommendations = recommendations(&anomalies);

    AnomalyDigest {
        time_window: format!("{} seconds", seconds),
        total_anomalies: anomalies.total(),
        overall_health: if recommendations.is_empty() {
            DigestHealth::Excellent
        } else {
            DigestHealth::NeedsAttention
        },
        anomalies,
        statistics,
        recommendations,
    }
}

/// One recommendation per metric that has any anomaly.
pub fn recommendations(report: &AnomalyReport) -> Vec<Recommendation> {
    let checks = [
        (
            report.gpu_anomalies.len(),
            RecommendationKind::GpuTemperature,
            Severity::Warning,
            "GPU temperature",
            "Check GPU cooling system and thermal paste",
        ),
        (
            report.cpu_anomalies.len(),
            RecommendationKind::CpuTemperature,
            Severity::Warning,
            "CPU temperature",
            "Check CPU cooler and case ventilation",
        ),
        (
            report.power_anomalies.len(),
            RecommendationKind::PowerDraw,
            Severity::Info,
            "power draw",
            "Monitor power consumption patterns",
        ),
    ];

    checks
        .into_iter()
        .filter(|(count, ..)| *count > 0)
        .map(|(count, kind, severity, label, advice)| Recommendation {
            kind,
            severity,
            message: format!("{} {} anomalies detected", count, label),
            recommendation: advice.to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Prompt context
// ---------------------------------------------------------------------------

/// Plain-text digest of the current hardware state for a chat assistant.
pub fn prompt_context(service: &TelemetryService, seconds: f64) -> Result<String> {
    let window = service.get_telemetry_since(seconds);
    let latest = service
        .get_latest_telemetry(1)
        .into_iter()
        .next()
        .ok_or(TelemetryError::NoData)?;
    let stats = service.get_telemetry_stats(seconds);
    let anomalies = service.detect_anomalies(seconds);

    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "CURRENT HARDWARE DATA:");
    let _ = writeln!(out, "- Latest GPU Temperature: {:.1}°C", latest.gpu_temp);
    let _ = writeln!(out, "- Latest CPU Temperature: {:.1}°C", latest.cpu_temp);
    let _ = writeln!(out, "- Latest Fan RPM: {:.0} RPM", latest.fan_rpm);
    let _ = writeln!(out, "- Latest Power Draw: {:.1}W", latest.power_draw);
    let _ = writeln!(out, "- Average GPU Temperature: {:.1}°C", stats.avg_gpu_temp);
    let _ = writeln!(out, "- Average CPU Temperature: {:.1}°C", stats.avg_cpu_temp);
    let _ = writeln!(out, "- Average Power Draw: {:.1}W", mean(&window, |s| s.power_draw));
    let _ = writeln!(out, "- Power Trend: {}", stats.power_trend);
    let _ = writeln!(out, "- Total Anomalies Detected: {}", anomalies.total());
    let _ = writeln!(out, "- GPU Anomalies: {}", anomalies.gpu_anomalies.len());
    let _ = writeln!(out, "- CPU Anomalies: {}", anomalies.cpu_anomalies.len());
    let _ = writeln!(out, "- Power Anomalies: {}", anomalies.power_anomalies.len());
    let _ = writeln!(out);
    let _ = writeln!(out, "RECENT READINGS (Last {} entries):", PROMPT_RECENT_READINGS);

    for sample in window.iter().take(PROMPT_RECENT_READINGS) {
        let time = DateTime::<Utc>::from_timestamp_millis((sample.timestamp * 1000.0) as i64)
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let _ = writeln!(
            out,
            "- {}: GPU {:.1}°C ({}), CPU {:.1}°C ({}), Fan {:.0} RPM, Power {:.1}W",
            time,
            sample.gpu_temp,
            TemperatureLabel::for_temp(sample.gpu_temp),
            sample.cpu_temp,
            TemperatureLabel::for_temp(sample.cpu_temp),
            sample.fan_rpm,
            sample.power_draw
        );
    }

    Ok(out)
}
