//! Threshold evaluation over the most recent readings.
//!
//! An alert is raised when a metric stays out of its comfortable band for a
//! whole window of consecutive readings (five by default). Only one alert is
//! raised per evaluation; temperature takes precedence over humidity, and
//! humidity over air quality.
//!
//! # Example
//!
//! ```
//! use sensordash_core::{Thresholds, AlertKind};
//! use sensordash_types::Reading;
//!
//! let thresholds = Thresholds::default();
//!
//! let readings: Vec<Reading> = [31.0, 32.0, 33.0, 34.0, 35.0]
//!     .into_iter()
//!     .map(|t| Reading { temperature: t, humidity: 40.0, air_quality: 20.0, ..Default::default() })
//!     .collect();
//!
//! let alert = thresholds.evaluate(&readings).unwrap();
//! assert_eq!(alert.kind, AlertKind::Temperature);
//! assert_eq!(alert.temperature, 33.0);
//! ```

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use sensordash_types::{AlertEvent, AlertKind, Reading};

/// Configuration for alert thresholds.
///
/// All bounds are strict: a reading equal to a bound is in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Number of consecutive readings that must all breach.
    pub window: usize,
    /// Temperature above this is too warm (°C).
    pub temperature_high: f64,
    /// Temperature below this is too cold (°C).
    pub temperature_low: f64,
    /// Humidity above this is too humid (%).
    pub humidity_high: f64,
    /// Air quality value above this is poor.
    pub air_quality_high: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            window: 5,
            temperature_high: 30.0,
            temperature_low: 10.0,
            humidity_high: 60.0,
            air_quality_high: 50.0,
        }
    }
}

/// Threshold evaluator for sensor readings.
#[derive(Debug, Clone, Default)]
pub struct Thresholds {
    config: ThresholdConfig,
}

impl Thresholds {
    /// Create a new threshold evaluator with the given configuration.
    ///
    /// A window of zero is treated as one.
    pub fn new(mut config: ThresholdConfig) -> Self {
        config.window = config.window.max(1);
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// Whether a single temperature is outside the comfortable band.
    pub fn temperature_breached(&self, celsius: f64) -> bool {
        celsius > self.config.temperature_high || celsius < self.config.temperature_low
    }

    /// Whether a single humidity value is too high.
    pub fn humidity_breached(&self, percent: f64) -> bool {
        percent > self.config.humidity_high
    }

    /// Whether a single air quality value is poor.
    pub fn air_quality_breached(&self, value: f64) -> bool {
        value > self.config.air_quality_high
    }

    /// Which metric, if any, breaches across the whole window.
    ///
    /// Returns `None` when fewer than `window` readings are available.
    pub fn breach(&self, readings: &[Reading]) -> Option<AlertKind> {
        let window = self.window_of(readings)?;

        if window.iter().all(|r| self.temperature_breached(r.temperature)) {
            Some(AlertKind::Temperature)
        } else if window.iter().all(|r| self.humidity_breached(r.humidity)) {
            Some(AlertKind::Humidity)
        } else if window.iter().all(|r| self.air_quality_breached(r.air_quality)) {
            Some(AlertKind::AirQuality)
        } else {
            None
        }
    }

    /// Evaluate the readings, stamping any alert with the current time.
    pub fn evaluate(&self, readings: &[Reading]) -> Option<AlertEvent> {
        self.evaluate_at(readings, OffsetDateTime::now_utc())
    }

    /// Evaluate the readings, stamping any alert with `now`.
    pub fn evaluate_at(&self, readings: &[Reading], now: OffsetDateTime) -> Option<AlertEvent> {
        let kind = self.breach(readings)?;
        let window = self.window_of(readings)?;
        let (temperature, humidity, air_quality) = window_averages(window);
        Some(AlertEvent::new(kind, temperature, humidity, air_quality, now))
    }

    fn window_of<'a>(&self, readings: &'a [Reading]) -> Option<&'a [Reading]> {
        let n = self.config.window;
        (readings.len() >= n).then(|| &readings[readings.len() - n..])
    }
}

/// Mean temperature, humidity and air quality over a slice of readings.
pub fn window_averages(window: &[Reading]) -> (f64, f64, f64) {
    if window.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let n = window.len() as f64;
    let sum = window.iter().fold((0.0, 0.0, 0.0), |acc, r| {
        (acc.0 + r.temperature, acc.1 + r.humidity, acc.2 + r.air_quality)
    });
    (sum.0 / n, sum.1 / n, sum.2 / n)
}
