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

    /// Page could not be fetched
    #[error("HTTP error for {url}: {message}")]
    Http {
        /// Requested URL
        url: String,
        /// Error message
        message: String,
    },

    /// Some lookups came back empty
    #[error("{missing} of {total} lookups found nothing")]
    Missing {
        /// Failed lookups
        missing: usize,
        /// All lookups
        total: usize,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sleuth library error
    #[error("{0}")]
    Sleuth(#[from] sleuth::SleuthError),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Create an HTTP error
    #[must_use]
    pub fn http(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Http {
            url: url.into(),
            message: message.into(),
        }
    }
}
