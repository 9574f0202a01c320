//! Export functionality for telemetry windows.
//!
//! Supports CSV for spreadsheet analysis and pretty-printed JSON.

use crate::core::{Result, TelemetryError, TelemetrySample};
use crate::telemetry::TelemetryService;
use std::io::Write;

/// CSV header, one column per sample field.
pub const CSV_HEADER: &str = "timestamp,gpu_temp,cpu_temp,fan_rpm,power_draw";

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Pretty-printed JSON array
    Json,
}

impl ExportFormat {
    /// MIME type for HTTP responses
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(TelemetryError::export(format!("Unknown export format: {}", s))),
        }
    }
}

/// Render samples in the requested format.
pub fn render(samples: &[TelemetrySample], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => {
            let mut out = Vec::new();
            write_csv(&mut out, samples)?;
            String::from_utf8(out).map_err(|e| TelemetryError::export(e.to_string()))
        },
        ExportFormat::Json => Ok(serde_json::to_string_pretty(samples)?),
    }
}

/// Write samples as CSV, header first, in the given order.
pub fn write_csv<W: Write>(writer: &mut W, samples: &[TelemetrySample]) -> Result<()> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for s in samples {
        writeln!(
            writer,
            "{},{},{},{},{}",
            s.timestamp, s.gpu_temp, s.cpu_temp, s.fan_rpm, s.power_draw
        )?;
    }
    Ok(())
}

/// Telemetry window exporter.
pub struct TelemetryExporter<'a> {
    service: &'a TelemetryService,
}

impl<'a> TelemetryExporter<'a> {
    /// Create a new exporter.
    pub fn new(service: &'a TelemetryService) -> Self {
        Self { service }
    }

    /// Export the last `seconds` of telemetry, newest-first.
    pub fn export_window(&self, seconds: f64, format: ExportFormat) -> Result<String> {
        let samples = self.service.get_telemetry_since(seconds);
        tracing::debug!(count = samples.len(), ?format, "Exporting telemetry window");
        render(&samples, format)
    }
}
