//! Command-line interface for thermo-telemetry.
//!
//! Runs the telemetry service with its HTTP API, or prints a one-shot export.
//! Just run `thermo-telemetry` to start with sensible defaults.

use crate::api;
use crate::core::config::ConfigBuilder;
use crate::core::{Config, Result, TelemetryError};
use crate::export::{ExportFormat, TelemetryExporter};
use crate::telemetry::TelemetryService;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

/// Hardware telemetry buffer with statistical anomaly detection
#[derive(Parser, Debug)]
#[command(name = "thermo-telemetry")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// HTTP API port
    #[arg(short, long, env = "THERMO_PORT")]
    pub port: Option<u16>,

    /// Configuration file path (default: ~/.config/thermo-telemetry/config.yaml)
    #[arg(short, long, env = "THERMO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Do not start the synthetic sample generator
    #[arg(long, env = "THERMO_NO_GENERATOR")]
    pub no_generator: bool,

    /// Seed the sample generator for reproducible runs
    #[arg(long, env = "THERMO_SEED")]
    pub seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, env = "THERMO_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,

    /// Print a telemetry window in the given format (csv, json) and exit
    #[arg(long, value_name = "FORMAT")]
    pub export: Option<ExportFormat>,

    /// Window in seconds for --export
    #[arg(long, default_value_t = 3600.0, requires = "export")]
    pub window: f64,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments (highest priority)
    /// 2. Environment variables
    /// 3. Config file
    /// 4. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = match &self.config {
            Some(path) => Some(path.clone()),
            None => default_config_path().filter(|p| p.exists()),
        };

        if let Some(path) = config_path {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => builder = builder.from_yaml(&content)?,
                Err(e) if self.config.is_some() => {
                    return Err(TelemetryError::config(format!(
                        "Failed to read config file {:?}: {}",
                        path, e
                    )));
                },
                // Default file vanished between the check and the read
                Err(_) => {},
            }
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(seed) = self.seed {
            builder = builder.seed(seed);
        }
        if self.no_generator {
            builder = builder.generator_enabled(false);
        }

        builder.debug(self.debug).build()
    }

    /// Initialize logging. `--debug` wins over `THERMO_LOG_LEVEL`, which wins
    /// over the configured level.
    pub fn init_logging(&self, config: &Config) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let log_level = if self.debug {
            "debug".to_string()
        } else {
            std::env::var("THERMO_LOG_LEVEL")
                .unwrap_or_else(|_| config.logging.level.as_str().to_string())
        };

        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(self.debug)
            .with_line_number(self.debug)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("thermo-telemetry").join("config.yaml"))
}

/// Execute the thermo-telemetry application.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config().await?;

    if cli.check_config {
        println!("Configuration is valid!");
        println!("  Capacity: {}", config.retention.capacity);
        println!("  Initial burst: {}", config.generator.initial_burst);
        println!("  Interval: {:?}", config.generator.interval);
        println!("  Generator enabled: {}", config.generator.enabled);
        println!("  API: {}:{}", config.api.bind_address, config.api.port);
        return Ok(());
    }

    cli.init_logging(&config)?;
    if let Some(path) = &cli.config {
        tracing::info!("Loaded configuration from: {:?}", path);
    }

    let service = Arc::new(TelemetryService::new(config)?);
    if service.config().generator.enabled {
        service.init()?;
    } else {
        tracing::info!("Synthetic generator disabled, waiting for ingested samples");
    }

    if let Some(format) = cli.export {
        let output = TelemetryExporter::new(&service).export_window(cli.window, format)?;
        service.destroy();
        print!("{}", output);
        return Ok(());
    }

    let api_config = service.config().api.clone();
    let result = api::start_server(Arc::clone(&service), api_config, shutdown_signal()).await;

    service.destroy();
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_export_mode() {
        let cli = Cli::parse_from(["thermo-telemetry", "--export", "json", "--window", "60"]);
        assert_eq!(cli.export, Some(ExportFormat::Json));
        assert_eq!(cli.window, 60.0);
    }

    #[test]
    fn test_window_requires_export() {
        assert!(Cli::try_parse_from(["thermo-telemetry", "--window", "60"]).is_err());
    }

    #[tokio::test]
    async fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "thermo-telemetry",
            "--port",
            "9000",
            "--seed",
            "7",
            "--no-generator",
            "--config",
            "/nonexistent/thermo.yaml",
        ]);
        assert!(cli.load_config().await.is_err());

        let cli = Cli::parse_from(["thermo-telemetry", "--port", "9000", "--seed", "7", "--no-generator"]);
        let builder = ConfigBuilder::new();
        let config = cli.build_config_from_args(builder).unwrap();
        assert_eq!(config.api.port, 9000);
        assert_eq!(config.generator.seed, Some(7));
        assert!(!config.generator.enabled);
    }

    #[tokio::test]
    async fn test_load_config_from_file_with_overrides() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "retention:\n  capacity: 300\ngenerator:\n  interval: 500ms\napi:\n  port: 9100\n"
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::parse_from(["thermo-telemetry", "--config", path.as_str()]);
        let config = cli.load_config().await.unwrap();
        assert_eq!(config.retention.capacity, 300);
        assert_eq!(config.generator.interval, std::time::Duration::from_millis(500));
        assert_eq!(config.api.port, 9100);

        let cli = Cli::parse_from(["thermo-telemetry", "--config", path.as_str(), "--port", "9200"]);
        let config = cli.load_config().await.unwrap();
        assert_eq!(config.retention.capacity, 300);
        assert_eq!(config.api.port, 9200);
    }

    #[tokio::test]
    async fn test_load_config_rejects_bad_yaml() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "retention:\n  capacity: 5000\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::parse_from(["thermo-telemetry", "--config", path.as_str()]);
        assert!(cli.load_config().await.is_err());
    }
}
