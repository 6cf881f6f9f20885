//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },

    /// The binary was built without browser support
    #[error("Browser support not enabled. Rebuild with --features browser")]
    BrowserUnavailable,

    /// Strict run with failed checks
    #[error("{failures} check(s) failed in {tables} table(s)")]
    ChecksFailed {
        /// Failed checks across the run
        failures: usize,
        /// Tables with at least one failure
        tables: usize,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Suite file parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Report serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// tablecheck library error
    #[error("tablecheck error: {0}")]
    TableCheck(#[from] tablecheck::TableCheckError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
