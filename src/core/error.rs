use thiserror::Error;

/// Errors raised by the telemetry service and its surfaces.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The generator could not be scheduled
    #[error("Scheduler error: {0}")]
    Runtime(String),

    /// Rendering an export failed
    #[error("Export error: {0}")]
    Export(String),

    /// No tool is registered under this name
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// A tool call carried arguments it cannot use
    #[error("Invalid tool arguments for {tool}: {message}")]
    InvalidArguments {
        /// Tool name
        tool: String,
        /// What was wrong with the arguments
        message: String,
    },

    /// A reading with non-finite values
    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    /// The buffer holds no samples
    #[error("No telemetry data available")]
    NoData,

    /// I/O failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML decoding failure
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

impl TelemetryError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new scheduler/runtime error
    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        Self::Runtime(msg.into())
    }

    /// Creates a new export error
    pub fn export<S: Into<String>>(msg: S) -> Self {
        Self::Export(msg.into())
    }

    /// Creates a new invalid arguments error for a tool
    pub fn invalid_arguments<T: Into<String>, S: Into<String>>(tool: T, msg: S) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            message: msg.into(),
        }
    }

    /// Returns true if the caller can fix the request and retry
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ToolNotFound(_)
                | Self::InvalidArguments { .. }
                | Self::InvalidSample(_)
                | Self::Export(_)
                | Self::NoData
        )
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Runtime(_) => "runtime",
            Self::Export(_) => "export",
            Self::ToolNotFound(_) => "not_found",
            Self::InvalidArguments { .. } | Self::InvalidSample(_) => "validation",
            Self::NoData => "empty",
            Self::Io(_) => "io",
            Self::Serialization(_) | Self::Yaml(_) => "serialization",
        }
    }
}
