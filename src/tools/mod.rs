//! Named query tools for chat and automation collaborators.
//!
//! Tools are grouped by server (telemetry, anomaly, analysis), described by a
//! JSON input schema, and executed with JSON arguments. Every call returns a
//! JSON object carrying a `success` flag; failures never escape as errors.

use crate::analysis;
use crate::core::{Result, TelemetryError};
use crate::telemetry::TelemetryService;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Window used when a call does not supply `seconds`.
pub const DEFAULT_WINDOW_SECS: f64 = 3600.0;

/// Tool server grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolServer {
    TelemetryServer,
    AnomalyServer,
    AnalysisServer,
}

impl ToolServer {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolServer::TelemetryServer => "telemetry-server",
            ToolServer::AnomalyServer => "anomaly-server",
            ToolServer::AnalysisServer => "analysis-server",
        }
    }
}

/// Static description of one tool.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub server: ToolServer,
    /// Whether the tool takes a `seconds` window argument
    pub windowed: bool,
}

impl ToolSpec {
    /// JSON schema of the tool's arguments.
    pub fn input_schema(&self) -> Value {
        if self.windowed {
            json!({
                "type": "object",
                "properties": {
                    "seconds": {
                        "type": "number",
                        "description": "Number of seconds to look back",
                        "default": DEFAULT_WINDOW_SECS
                    }
                },
                "required": ["seconds"]
            })
        } else {
            json!({ "type": "object", "properties": {}, "required": [] })
        }
    }

    /// Function-calling definition.
    pub fn definition(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.input_schema()
            }
        })
    }
}

const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "getRecentTelemetry",
        description: "Get recent telemetry data for the specified time window",
        server: ToolServer::TelemetryServer,
        windowed: true,
    },
    ToolSpec {
        name: "getLatestTelemetry",
        description: "Get the most recent telemetry reading",
        server: ToolServer::TelemetryServer,
        windowed: false,
    },
    ToolSpec {
        name: "getTelemetryStats",
        description: "Get statistical analysis of telemetry data",
        server: ToolServer::TelemetryServer,
        windowed: true,
    },
    ToolSpec {
        name: "detectAnomalies",
        description: "Detect anomalies in hardware telemetry data",
        server: ToolServer::AnomalyServer,
        windowed: true,
    },
    ToolSpec {
        name: "getAnomalyReport",
        description: "Get a detailed anomaly report with recommendations",
        server: ToolServer::AnomalyServer,
        windowed: true,
    },
    ToolSpec {
        name: "analyzePerformance",
        description: "Analyze overall hardware performance and provide insights",
        server: ToolServer::AnalysisServer,
        windowed: true,
    },
    ToolSpec {
        name: "getHealthStatus",
        description: "Get current hardware health status",
        server: ToolServer::AnalysisServer,
        windowed: false,
    },
];

/// Dispatches tool calls to a shared telemetry service.
pub struct ToolRegistry {
    service: Arc<TelemetryService>,
    default_window: f64,
    health_window: f64,
}

impl ToolRegistry {
    pub fn new(service: Arc<TelemetryService>) -> Self {
        let analysis = &service.config().analysis;
        let default_window = analysis.default_window.as_secs_f64();
        let health_window = analysis.health_window.as_secs_f64();

        Self {
            service,
            default_window,
            health_window,
        }
    }

    /// All known tools.
    pub fn tools(&self) -> &'static [ToolSpec] {
        TOOLS
    }

    pub fn get(&self, name: &str) -> Option<&'static ToolSpec> {
        TOOLS.iter().find(|t| t.name == name)
    }

    /// Function-calling definitions of every tool.
    pub fn definitions(&self) -> Vec<Value> {
        TOOLS.iter().map(ToolSpec::definition).collect()
    }

    /// Tools served by one server.
    pub fn tools_for(&self, server: ToolServer) -> impl Iterator<Item = &'static ToolSpec> {
        TOOLS.iter().filter(move |t| t.server == server)
    }

    /// Definitions grouped by server name.
    pub fn definitions_by_server(&self) -> BTreeMap<&'static str, Vec<Value>> {
        let mut servers: BTreeMap<&'static str, Vec<Value>> = BTreeMap::new();
        for tool in TOOLS {
            servers.entry(tool.server.as_str()).or_default().push(tool.definition());
        }
        servers
    }

    /// Run a tool and wrap the outcome in a `success` envelope.
    pub fn execute(&self, name: &str, args: &Value) -> Value {
        match self.dispatch(name, args) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(tool = name, category = e.category(), "Tool execution failed: {}", e);
                json!({ "success": false, "error": e.to_string() })
            },
        }
    }

    /// Run a tool, surfacing failures as errors.
    pub fn dispatch(&self, name: &str, args: &Value) -> Result<Value> {
        let spec = self
            .get(name)
            .ok_or_else(|| TelemetryError::ToolNotFound(name.to_string()))?;
        // The detector threshold is fixed for the service lifetime
        if args.get("threshold").is_some() {
            return Err(TelemetryError::invalid_arguments(
                spec.name,
                format!("threshold is fixed at {}", self.service.detector().threshold()),
            ));
        }
        let seconds = if spec.windowed {
            self.window_arg(spec, args)?
        } else {
            self.default_window
        };
        let time_window = format!("{} seconds", seconds);

        let service = self.service.as_ref();
        let value = match spec.name {
            "getRecentTelemetry" => {
                let data = service.get_telemetry_since(seconds);
                json!({
                    "success": true,
                    "count": data.len(),
                    "timeWindow": time_window,
                    "latest": data.first(),
                    "data": data,
                })
            },
            "getLatestTelemetry" => {
                let latest = service.get_latest_telemetry(1).into_iter().next();
                json!({
                    "success": true,
                    "timestamp": latest.map(|_| Utc::now().to_rfc3339()),
                    "data": latest,
                })
            },
            "getTelemetryStats" => {
                let stats = service.get_telemetry_stats(seconds);
                json!({
                    "success": true,
                    "stats": stats,
                    "timeWindow": time_window,
                    "summary": {
                        "avgGpuTemp": format!("{:.1}", stats.avg_gpu_temp),
                        "avgCpuTemp": format!("{:.1}", stats.avg_cpu_temp),
                        "latestFanRpm": format!("{:.0}", stats.latest_fan_rpm),
                        "powerTrend": stats.power_trend,
                    }
                })
            },
            "detectAnomalies" => {
                let anomalies = service.detect_anomalies(seconds);
                json!({
                    "success": true,
                    "summary": {
                        "totalAnomalies": anomalies.total(),
                        "gpuAnomalies": anomalies.gpu_anomalies.len(),
                        "cpuAnomalies": anomalies.cpu_anomalies.len(),
                        "powerAnomalies": anomalies.power_anomalies.len(),
                        "threshold": service.detector().threshold(),
                    },
                    "anomalies": anomalies,
                    "timeWindow": time_window,
                })
            },
            "getAnomalyReport" => {
                json!({ "success": true, "report": analysis::anomaly_digest(service, seconds) })
            },
            "analyzePerformance" => {
                let analysis = analysis::analyze_performance(service, seconds);
                json!({
                    "success": true,
                    "overallScore": analysis.overall_score,
                    "insights": analysis.insights,
                    "analysis": analysis,
                    "timeWindow": time_window,
                })
            },
            "getHealthStatus" => {
                let health = analysis::health_status(service, self.health_window)?;
                json!({ "success": true, "health": health })
            },
            other => return Err(TelemetryError::ToolNotFound(other.to_string())),
        };

        tracing::debug!(tool = name, "Executed tool");
        Ok(value)
    }

    fn window_arg(&self, spec: &ToolSpec, args: &Value) -> Result<f64> {
        match args.get("seconds") {
            None | Some(Value::Null) => Ok(self.default_window),
            Some(value) => value.as_f64().ok_or_else(|| {
                TelemetryError::invalid_arguments(spec.name, "seconds must be a number")
            }),
        }
    }
}
