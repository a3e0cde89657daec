//! Platform-agnostic types for a home environment sensor dashboard.
//!
//! This crate provides the data model shared by the dashboard library
//! (`sensordash-core`) and its front ends.
//!
//! # Features
//!
//! - [`Reading`]: one sample from the sensor node (temperature, humidity,
//!   air quality, light and motion flags)
//! - [`SensorTimestamp`]: parser for the node's `day-month-year` timestamps
//! - [`AlertKind`] / [`AlertEvent`]: threshold breaches
//! - [`LightStatus`]: derived light badge
//!
//! # Example
//!
//! ```
//! use sensordash_types::{LightStatus, Reading};
//!
//! let readings = vec![
//!     Reading { light_on: true, ..Default::default() },
//!     Reading { light_on: true, ..Default::default() },
//! ];
//! assert_eq!(LightStatus::from_readings(&readings), LightStatus::On);
//! ```

pub mod alert;
pub mod error;
pub mod reading;
pub mod timestamp;

pub use alert::{AlertEvent, AlertKind};
pub use error::{ParseError, ParseResult};
pub use reading::{LightStatus, Reading};
pub use timestamp::{SensorTimestamp, month_name, parse_month};
