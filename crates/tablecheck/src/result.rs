//! Result and error types for tablecheck.

use thiserror::Error;

/// Result type for tablecheck operations
pub type TableCheckResult<T> = Result<T, TableCheckError>;

/// Errors raised by drivers, fixtures and configuration.
///
/// Verification outcomes (mismatches, regressions) are not errors; they are
/// recorded as failed [`Check`](crate::Check)s. These variants describe the
/// conditions that prevent a check from being evaluated at all.
#[derive(Debug, Error)]
pub enum TableCheckError {
    /// No element matched the selector
    #[error("Element not found: {selector}")]
    ElementNotFound {
        /// Rendered selector
        selector: String,
    },

    /// A bounded wait expired
    #[error("Timed out after {ms}ms waiting for {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Description of the awaited condition
        waited_for: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunchError {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    NavigationError {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Any other driver-level failure
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Fixture could not be read or parsed
    #[error("Fixture error in {source_name}: {message}")]
    FixtureError {
        /// Fixture path or label
        source_name: String,
        /// Error message
        message: String,
    },

    /// Settings or contract are unusable
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TableCheckError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// True when the error means the element never showed up.
    ///
    /// Bounded waits that expire are reported the same way as a missing
    /// element.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::ElementNotFound { .. } | Self::Timeout { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = TableCheckError::Timeout {
            ms: 10_000,
            waited_for: "#pageSize".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Timed out after 10000ms waiting for #pageSize"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_not_found_classification() {
        let missing = TableCheckError::ElementNotFound {
            selector: "div".to_string(),
        };
        assert!(missing.is_not_found());
        assert!(!TableCheckError::driver("socket closed").is_not_found());
    }

    #[test]
    fn test_json_error_from() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: TableCheckError = json_err.into();
        assert!(err.to_string().starts_with("JSON error"));
    }
}
