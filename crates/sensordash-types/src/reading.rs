//! Sensor readings as stored by the sensor node.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::timestamp::SensorTimestamp;

/// One sensor sample.
///
/// Field names match the records the sensor node writes under
/// `sensor_data/`. Missing fields fall back to their zero value so a
/// partially written record still renders.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Reading {
    /// Local wall-clock time of the sample, e.g. `15-Mar-2024 12:34:56`.
    pub timestamp: String,
    /// Temperature in °C.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "de::number"))]
    pub temperature: f64,
    /// Relative humidity in %.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "de::number"))]
    pub humidity: f64,
    /// Raw MQ-135 air quality value.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "de::number"))]
    pub air_quality: f64,
    /// Light-dependent resistor output; `true` means low ambient light.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "de::bool_like"))]
    pub ldr_value: bool,
    /// Passive infrared sensor output; `true` means motion detected.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "de::bool_like"))]
    pub pir_value: bool,
    /// Sleep mode as seen by the node when it took the sample.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "de::bool_like"))]
    pub sleep_mode: bool,
    /// Whether the node switched its light on.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "de::bool_like"))]
    pub light_on: bool,
}

impl Reading {
    /// Parse the timestamp, if it is in a recognized format.
    #[must_use]
    pub fn parsed_timestamp(&self) -> Option<SensorTimestamp> {
        SensorTimestamp::parse(&self.timestamp).ok()
    }

    /// Calendar month (1..=12) of the sample, if the timestamp parses.
    #[must_use]
    pub fn month(&self) -> Option<u8> {
        self.parsed_timestamp().map(|ts| ts.month_number())
    }
}

/// Derived state of the node's light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LightStatus {
    On,
    #[default]
    Off,
}

impl LightStatus {
    /// Derive the light status from a sequence of readings.
    ///
    /// The light counts as on only when the last two readings both report
    /// it on. With fewer than two readings the status is `Off`.
    #[must_use]
    pub fn from_readings(readings: &[Reading]) -> Self {
        match readings {
            [.., a, b] if a.light_on && b.light_on => Self::On,
            _ => Self::Off,
        }
    }

    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl fmt::Display for LightStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => write!(f, "ON"),
            Self::Off => write!(f, "OFF"),
        }
    }
}

#[cfg(feature = "serde")]
mod de {
    use serde::de::{self, Deserializer, Unexpected, Visitor};
    use std::fmt;

    /// Accept JSON booleans, integers (0 is false) and the strings
    /// `true`/`false`/`1`/`0`. `null` reads as false.
    pub(super) fn bool_like<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct BoolLike;

        impl<'de> Visitor<'de> for BoolLike {
            type Value = bool;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a boolean, 0/1, or a boolean string")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
                Ok(v != 0)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
                Ok(v != 0)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<bool, E> {
                Ok(v != 0.0)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
                match v.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "on" => Ok(true),
                    "false" | "0" | "off" | "" => Ok(false),
                    _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
                }
            }

            fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
                Ok(false)
            }

            fn visit_none<E: de::Error>(self) -> Result<bool, E> {
                Ok(false)
            }
        }

        deserializer.deserialize_any(BoolLike)
    }

    /// Accept JSON numbers and numeric strings. `null` reads as 0.
    pub(super) fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Number;

        impl<'de> Visitor<'de> for Number {
            type Value = f64;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a number or numeric string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
                Ok(v)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
                v.trim()
                    .parse()
                    .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
            }

            fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
                Ok(0.0)
            }

            fn visit_none<E: de::Error>(self) -> Result<f64, E> {
                Ok(0.0)
            }
        }

        deserializer.deserialize_any(Number)
    }
}
