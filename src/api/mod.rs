//! HTTP API over the telemetry service.
//!
//! Serves window queries, stats, anomalies, export and tool execution, and
//! accepts readings pushed by external streamers on `POST /api/telemetry`.

use crate::analysis;
use crate::core::config::ApiConfig;
use crate::core::{Result, TelemetryError, TelemetrySample};
use crate::export::{ExportFormat, TelemetryExporter};
use crate::telemetry::TelemetryService;
use crate::tools::ToolRegistry;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// API server state.
#[derive(Clone)]
struct ApiState {
    service: Arc<TelemetryService>,
    tools: Arc<ToolRegistry>,
    config: ApiConfig,
}

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    generator_running: bool,
    sample_count: usize,
    capacity: usize,
}

/// Error response.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: u16,
}

/// Ingestion acknowledgement.
#[derive(Debug, Serialize)]
struct IngestResponse {
    success: bool,
    sample_count: usize,
}

/// Query parameters for windowed endpoints.
#[derive(Debug, Deserialize)]
struct WindowQuery {
    /// Seconds to look back
    seconds: Option<f64>,
}

/// Query parameters for the latest-samples endpoint.
#[derive(Debug, Deserialize)]
struct LatestQuery {
    limit: Option<usize>,
}

/// Query parameters for export.
#[derive(Debug, Deserialize)]
struct ExportQuery {
    seconds: Option<f64>,
    /// Export format (csv, json)
    format: Option<String>,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: status.as_u16(),
        }),
    )
        .into_response()
}

/// Build the router. Kept separate from [`start_server`] so it can be
/// exercised without binding a socket.
pub fn router(service: Arc<TelemetryService>, config: ApiConfig) -> Router {
    let tools = Arc::new(ToolRegistry::new(Arc::clone(&service)));
    let enable_cors = config.enable_cors;
    let state = ApiState {
        service,
        tools,
        config,
    };

    let mut app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/telemetry", get(window_handler).post(ingest_handler))
        .route("/api/telemetry/latest", get(latest_handler))
        .route("/api/telemetry/stats", get(stats_handler))
        .route("/api/telemetry/anomalies", get(anomalies_handler))
        .route("/api/telemetry/export", get(export_handler))
        .route("/api/context", get(context_handler))
        .route("/api/tools", get(list_tools_handler))
        .route("/api/tools/servers", get(tool_servers_handler))
        .route("/api/tools/:name", post(execute_tool_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    app
}

/// Serve the API until `shutdown` resolves.
pub async fn start_server<F>(
    service: Arc<TelemetryService>,
    config: ApiConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::new(config.bind_address, config.port);
    let app = router(service, config);

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        TelemetryError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to bind to {}: {}", addr, e),
        ))
    })?;
    tracing::info!("Starting API server on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}

impl ApiState {
    fn window(&self, seconds: Option<f64>) -> f64 {
        seconds.unwrap_or_else(|| self.service.config().analysis.default_window.as_secs_f64())
    }
}

/// GET /health
async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        generator_running: state.service.is_running(),
        sample_count: state.service.len(),
        capacity: state.service.capacity(),
    })
}

/// GET /api/telemetry - samples in a trailing window, newest-first
async fn window_handler(
    State(state): State<ApiState>,
    Query(params): Query<WindowQuery>,
) -> impl IntoResponse {
    let mut samples = state.service.get_telemetry_since(state.window(params.seconds));
    samples.truncate(state.config.max_results);
    Json(samples)
}

/// POST /api/telemetry - ingest one externally produced reading
async fn ingest_handler(
    State(state): State<ApiState>,
    Json(sample): Json<TelemetrySample>,
) -> Response {
    if let Err(e) = sample.validate() {
        tracing::warn!("Rejected telemetry sample: {}", e);
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    state.service.insert_telemetry(sample);
    Json(IngestResponse {
        success: true,
        sample_count: state.service.len(),
    })
    .into_response()
}

/// GET /api/telemetry/latest
async fn latest_handler(
    State(state): State<ApiState>,
    Query(params): Query<LatestQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(1).min(state.config.max_results);
    Json(state.service.get_latest_telemetry(limit))
}

/// GET /api/telemetry/stats
async fn stats_handler(
    State(state): State<ApiState>,
    Query(params): Query<WindowQuery>,
) -> impl IntoResponse {
    Json(state.service.get_telemetry_stats(state.window(params.seconds)))
}

/// GET /api/telemetry/anomalies
async fn anomalies_handler(
    State(state): State<ApiState>,
    Query(params): Query<WindowQuery>,
) -> impl IntoResponse {
    Json(state.service.detect_anomalies(state.window(params.seconds)))
}

/// GET /api/telemetry/export
async fn export_handler(
    State(state): State<ApiState>,
    Query(params): Query<ExportQuery>,
) -> Response {
    let format = match params.format.as_deref().unwrap_or("csv").parse::<ExportFormat>() {
        Ok(f) => f,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let seconds = state.window(params.seconds);
    match TelemetryExporter::new(&state.service).export_window(seconds, format) {
        Ok(body) => ([(header::CONTENT_TYPE, format.content_type())], body).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("Export failed: {}", e)),
    }
}

/// GET /api/context - plain-text hardware digest for a chat assistant
async fn context_handler(
    State(state): State<ApiState>,
    Query(params): Query<WindowQuery>,
) -> Response {
    match analysis::prompt_context(&state.service, state.window(params.seconds)) {
        Ok(text) => ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response(),
        Err(TelemetryError::NoData) => {
            error_response(StatusCode::NOT_FOUND, TelemetryError::NoData.to_string())
        },
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// GET /api/tools
async fn list_tools_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.tools.definitions())
}

/// GET /api/tools/servers - definitions grouped by tool server
async fn tool_servers_handler(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.tools.definitions_by_server())
}

/// POST /api/tools/:name - body is the tool's JSON arguments (may be empty)
async fn execute_tool_handler(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    let args: Value = if body.is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                return error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON body: {}", e))
            },
        }
    };

    if state.tools.get(&name).is_none() {
        return error_response(StatusCode::NOT_FOUND, format!("Tool not found: {}", name));
    }

    Json(state.tools.execute(&name, &args)).into_response()
}
