//! Result and error types for Sleuth.

use thiserror::Error;

/// Result type for Sleuth operations
pub type SleuthResult<T> = Result<T, SleuthError>;

/// Errors that can occur in Sleuth
#[derive(Debug, Error)]
pub enum SleuthError {
    /// Every strategy was exhausted without a match.
    ///
    /// The diagnostics are a dump of what the page did contain, for triage.
    #[error("{what} not found ({} diagnostic entries)", diagnostics.len())]
    NotFound {
        /// What was being resolved
        what: String,
        /// Observations collected while searching
        diagnostics: Vec<String>,
    },

    /// Network-level failure while probing a link
    #[error("Link \"{text}\" at {url} failed to resolve: {message}")]
    ProbeError {
        /// Probed URL
        url: String,
        /// Visible link text
        text: String,
        /// Error message
        message: String,
    },

    /// One or more links came back unhealthy
    #[error("{} link(s) failed health check", failures.len())]
    LinkCheckFailed {
        /// One line per failing link
        failures: Vec<String>,
    },

    /// Operation timed out
    #[error("Timed out after {ms}ms waiting for {what}")]
    Timeout {
        /// What was awaited
        what: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// CSS selector could not be parsed
    #[error("Invalid selector `{selector}`: {message}")]
    InvalidSelector {
        /// Offending selector
        selector: String,
        /// Parser message
        message: String,
    },

    /// Text pattern could not be compiled
    #[error("Invalid pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Compiler message
        message: String,
    },

    /// URL could not be parsed or joined
    #[error("Invalid URL `{url}`: {message}")]
    InvalidUrl {
        /// Offending URL
        url: String,
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Page error
    #[error("Page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SleuthError {
    /// Create a not-found error with diagnostics
    #[must_use]
    pub fn not_found(what: impl Into<String>, diagnostics: Vec<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            diagnostics,
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a page error
    #[must_use]
    pub fn page(message: impl Into<String>) -> Self {
        Self::Page {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// NotFound and Timeout are handled identically at call sites
    #[must_use]
    pub const fn is_not_found_like(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Timeout { .. })
    }

    /// Diagnostic payload, if this error carries one
    #[must_use]
    pub fn diagnostics(&self) -> &[String] {
        match self {
            Self::NotFound { diagnostics, .. } => diagnostics,
            Self::LinkCheckFailed { failures } => failures,
            _ => &[],
        }
    }
}
