//! Error types and result aliases for wheelhouse operations.
//!
//! Provides a unified error type that covers all possible error conditions
//! across the wheelhouse crates with actionable error messages.

use thiserror::Error;

/// Unified error type for all wheelhouse operations
#[derive(Error, Debug)]
pub enum WheelhouseError {
    // Parse errors
    #[error("Invalid package specification '{input}': {reason}")]
    SpecParse { input: String, reason: String },

    #[error("Invalid version string: {input}")]
    VersionParse { input: String },

    // Registry errors
    #[error("Package '{name}' not found in registry")]
    PackageNotFound { name: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Resolution errors
    #[error("Package conflicts detected: {count} conflicts found")]
    ConflictsDetected { count: usize },

    // Configuration errors
    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for wheelhouse operations
pub type WheelhouseResult<T> = Result<T, WheelhouseError>;

impl WheelhouseError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            WheelhouseError::Network { .. } | WheelhouseError::Io { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            WheelhouseError::PackageNotFound { .. } => {
                Some("Check the package name spelling or try searching PyPI")
            }
            WheelhouseError::Network { .. } => Some("Check your internet connection and try again"),
            WheelhouseError::ConflictsDetected { .. } => {
                Some("Re-run with --strategy auto to attempt automatic conflict resolution")
            }
            WheelhouseError::SpecParse { .. } => {
                Some("Specifications look like 'requests>=2.31.0' or a bare package name")
            }
            _ => None,
        }
    }
}
