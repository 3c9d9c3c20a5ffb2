//! Pipeline Error Types

use analytics::AnalyticsError;
use data_validator::ValidationError;
use std::path::PathBuf;
use thiserror::Error;
use timeline::GridError;

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration could not be loaded or deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Timeline granularity rejected
    #[error("Timeline error: {0}")]
    Grid(#[from] GridError),

    /// Validation settings rejected
    #[error("Validation config error: {0}")]
    Validation(#[from] ValidationError),

    /// Aggregation or statistics input rejected
    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    /// File system error on a specific path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input discovery pattern could not be built
    #[error("Invalid discovery pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// Unknown log level name
    #[error("Invalid log level: {0:?}")]
    InvalidLogLevel(String),

    /// Global tracing subscriber already installed
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}
