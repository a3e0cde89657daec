//! Error types for sensordash-core.
//!
//! # Recovery
//!
//! Nothing in the dashboard is fatal at runtime and nothing is retried:
//!
//! | Error | Where it happens | Handling |
//! |-------|------------------|----------|
//! | [`Error::Http`] / [`Error::Api`] on fetch | Data fetcher | Logged, previous readings kept |
//! | [`Error::Http`] / [`Error::Api`] on write | Sleep mode, alert log | Logged |
//! | [`Error::Notification`] | Desktop channel | Logged |
//! | [`Error::Io`] | Audio cue, recognizer process | Logged |
//! | [`Error::Speech`] | Voice bridge | Shown to the user |
//! | [`Error::InvalidUrl`] / [`Error::NotConfigured`] | Startup | Reported by the CLI |

use std::time::Duration;

use thiserror::Error;

/// Errors produced by the dashboard library.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// HTTP transport failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body, or the status text.
        message: String,
    },

    /// A configured URL is not usable.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A payload could not be (de)serialized.
    #[error("Invalid data: {0}")]
    Json(#[from] serde_json::Error),

    /// The remote service answered with a payload of an unexpected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Local I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The desktop notification could not be shown.
    #[error("Notification failed: {0}")]
    Notification(String),

    /// Speech recognition failed.
    #[error("Speech recognition failed: {0}")]
    Speech(String),

    /// An operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// A feature was used without the configuration it needs.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,
}

impl Error {
    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a not-configured error.
    pub fn not_configured(what: impl Into<String>) -> Self {
        Self::NotConfigured(what.into())
    }
}

/// Result type alias using sensordash-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
