//! Configuration management.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Environment variable and CLI overrides (applied by the CLI layer)
//! - Validation and defaults

use crate::core::{Result, TelemetryError};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

/// Hard upper bound on retained samples.
pub const MAX_CAPACITY: usize = 1000;

/// Complete service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Retention buffer configuration
    pub retention: RetentionConfig,
    /// Synthetic sample generation
    pub generator: GeneratorConfig,
    /// Default windows used by analysis tools
    pub analysis: AnalysisConfig,
    /// HTTP API configuration
    pub api: ApiConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Debug mode
    #[serde(skip)]
    pub debug: bool,
}

/// Retention buffer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Maximum number of samples kept in memory
    pub capacity: usize,
}

/// Generator and scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Start the periodic generator when the service is initialised
    pub enabled: bool,
    /// Samples produced immediately on start
    pub initial_burst: usize,
    /// Period between generated samples
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

/// Analysis window defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Window used when a tool call does not give one
    #[serde(with = "humantime_serde")]
    pub default_window: Duration,
    /// Window for recent anomalies in the health check
    #[serde(with = "humantime_serde")]
    pub health_window: Duration,
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address
    pub bind_address: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Enable permissive CORS headers
    pub enable_cors: bool,
    /// Maximum samples returned by list endpoints
    pub max_results: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            retention: RetentionConfig::default(),
            generator: GeneratorConfig::default(),
            analysis: AnalysisConfig::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
            debug: false,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        RetentionConfig {
            capacity: MAX_CAPACITY,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            enabled: true,
            initial_burst: 50,
            interval: Duration::from_secs(2),
            seed: None,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            default_window: Duration::from_secs(3600), // 1 hour
            health_window: Duration::from_secs(300),   // 5 minutes
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            bind_address: IpAddr::from([127, 0, 0, 1]),
            port: 8081,
            enable_cors: true,
            max_results: MAX_CAPACITY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TelemetryError::config(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        ConfigBuilder::new().from_yaml(&content)?.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.retention.capacity == 0 {
            return Err(TelemetryError::config("retention.capacity must be greater than 0"));
        }

        if self.retention.capacity > MAX_CAPACITY {
            return Err(TelemetryError::config(format!(
                "retention.capacity must not exceed {}, got {}",
                MAX_CAPACITY, self.retention.capacity
            )));
        }

        if self.generator.interval.is_zero() {
            return Err(TelemetryError::config("generator.interval must be greater than 0"));
        }

        if self.generator.initial_burst > self.retention.capacity {
            return Err(TelemetryError::config(format!(
                "generator.initial_burst ({}) exceeds retention.capacity ({})",
                self.generator.initial_burst, self.retention.capacity
            )));
        }

        if self.api.port == 0 {
            return Err(TelemetryError::config("api.port must be greater than 0"));
        }

        if self.api.max_results == 0 {
            return Err(TelemetryError::config("api.max_results must be greater than 0"));
        }

        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| TelemetryError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set retention capacity
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.retention.capacity = capacity;
        self
    }

    /// Enable or disable the periodic generator
    pub fn generator_enabled(mut self, enabled: bool) -> Self {
        self.config.generator.enabled = enabled;
        self
    }

    /// Set the initial burst size
    pub fn initial_burst(mut self, count: usize) -> Self {
        self.config.generator.initial_burst = count;
        self
    }

    /// Set the generation period
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.generator.interval = interval;
        self
    }

    /// Seed the sample generator
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.generator.seed = Some(seed);
        self
    }

    /// Set API port
    pub fn port(mut self, port: u16) -> Self {
        self.config.api.port = port;
        self
    }

    /// Set debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retention.capacity, 1000);
        assert_eq!(config.generator.initial_burst, 50);
        assert_eq!(config.generator.interval, Duration::from_secs(2));
    }

    #[test]
    fn test_capacity_bounds() {
        let mut config = Config::default();
        config.retention.capacity = 0;
        assert!(config.validate().is_err());

        config.retention.capacity = MAX_CAPACITY + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = ConfigBuilder::new().interval(Duration::ZERO).build();
        assert!(config.is_err());
    }

    #[test]
    fn test_burst_larger_than_capacity_rejected() {
        let config = ConfigBuilder::new().capacity(10).initial_burst(20).build();
        assert!(config.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .capacity(500)
            .initial_burst(10)
            .interval(Duration::from_millis(500))
            .seed(42)
            .port(9000)
            .debug(true)
            .build()
            .unwrap();

        assert_eq!(config.retention.capacity, 500);
        assert_eq!(config.generator.initial_burst, 10);
        assert_eq!(config.generator.interval, Duration::from_millis(500));
        assert_eq!(config.generator.seed, Some(42));
        assert_eq!(config.api.port, 9000);
        assert!(config.debug);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
retention:
  capacity: 200
generator:
  initial_burst: 5
  interval: 500ms
  seed: 7
analysis:
  health_window: 10m
api:
  port: 9191
logging:
  level: debug
"#;

        let config = ConfigBuilder::new().from_yaml(yaml).unwrap().build().unwrap();

        assert_eq!(config.retention.capacity, 200);
        assert_eq!(config.generator.initial_burst, 5);
        assert_eq!(config.generator.interval, Duration::from_millis(500));
        assert_eq!(config.generator.seed, Some(7));
        assert!(config.generator.enabled);
        assert_eq!(config.analysis.health_window, Duration::from_secs(600));
        assert_eq!(config.analysis.default_window, Duration::from_secs(3600));
        assert_eq!(config.api.port, 9191);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }
}
