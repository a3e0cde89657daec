//! Chart series and dashboard status derived from the reading sequence.

use sensordash_types::{LightStatus, Reading};

/// Number of readings plotted by default.
pub const DEFAULT_CHART_POINTS: usize = 15;

/// Shown before the first fetch completes.
pub const LOADING_TEXT: &str = "Loading data...";

/// Shown when a fetch returned no readings.
pub const NO_DATA_TEXT: &str = "No data available";

/// Chart data for the most recent readings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    /// X axis labels, one per point.
    pub labels: Vec<String>,
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    pub air_quality: Vec<f64>,
}

impl ChartData {
    /// Take the last `points` readings. Shorter sequences are plotted whole.
    pub fn from_readings(readings: &[Reading], points: usize) -> Self {
        let start = readings.len().saturating_sub(points);
        let window = &readings[start..];

        Self {
            labels: window.iter().map(chart_label).collect(),
            temperature: window.iter().map(|r| r.temperature).collect(),
            humidity: window.iter().map(|r| r.humidity).collect(),
            air_quality: window.iter().map(|r| r.air_quality).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Smallest and largest value across all three series.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        self.temperature
            .iter()
            .chain(&self.humidity)
            .chain(&self.air_quality)
            .copied()
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Axis label for a reading: compact when the timestamp parses, raw otherwise.
pub fn chart_label(reading: &Reading) -> String {
    reading
        .parsed_timestamp()
        .map(|ts| ts.short_label())
        .unwrap_or_else(|| reading.timestamp.clone())
}

/// Placeholder text when there is nothing to render.
pub fn empty_state(loading: bool, reading_count: usize) -> Option<&'static str> {
    if loading {
        Some(LOADING_TEXT)
    } else if reading_count == 0 {
        Some(NO_DATA_TEXT)
    } else {
        None
    }
}

/// Latest values for the summary panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary<'a> {
    pub latest: &'a Reading,
    pub light: LightStatus,
    pub count: usize,
}

impl<'a> Summary<'a> {
    pub fn from_readings(readings: &'a [Reading]) -> Option<Self> {
        readings.last().map(|latest| Self {
            latest,
            light: LightStatus::from_readings(readings),
            count: readings.len(),
        })
    }
}
