//! Alert events raised by threshold evaluation.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Which metric triggered an alert.
///
/// Declaration order is precedence order: when several metrics breach at
/// once, the first one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AlertKind {
    Temperature,
    Humidity,
    AirQuality,
}

impl AlertKind {
    /// Message shown to the user for this alert.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature is currently in an uncomfortable stage!",
            Self::Humidity => "Humidity is currently in an uncomfortable stage!",
            Self::AirQuality => "Air Quality is consistently poor!",
        }
    }

    /// Short label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::AirQuality => "Air Quality",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A recorded threshold breach with values averaged over the evaluation
/// window.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlertEvent {
    /// Metric that triggered the alert.
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: AlertKind,
    /// Human-readable message.
    pub message: String,
    /// Mean temperature over the window.
    pub temperature: f64,
    /// Mean humidity over the window.
    pub humidity: f64,
    /// Mean air quality over the window.
    pub air_quality: f64,
    /// When the alert was raised.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,
}

impl AlertEvent {
    /// Create an alert of the given kind with its standard message.
    #[must_use]
    pub fn new(
        kind: AlertKind,
        temperature: f64,
        humidity: f64,
        air_quality: f64,
        timestamp: OffsetDateTime,
    ) -> Self {
        Self {
            kind,
            message: kind.message().to_string(),
            temperature,
            humidity,
            air_quality,
            timestamp,
        }
    }
}
