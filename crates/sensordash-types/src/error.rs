//! Error types for data parsing in sensordash-types.

use thiserror::Error;

/// Errors that can occur when parsing sensor data.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The timestamp does not have day, month and year components.
    #[error("Invalid timestamp '{0}': expected day-month-year")]
    InvalidTimestamp(String),

    /// The month component is neither a month name nor a number in 1..=12.
    #[error("Invalid month '{0}'")]
    InvalidMonth(String),

    /// A value could not be interpreted.
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using sensordash-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
