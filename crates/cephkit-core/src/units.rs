//! Measurement units
//!
//! Units attached to derived measurements and helpers to format values
//! for reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unit of a derived measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementUnit {
    /// Millimetres (calibrated length)
    Millimeters,
    /// Degrees
    Degrees,
    /// Percent (ratios and indices)
    Percent,
    /// Raw image pixels (uncalibrated length)
    Pixels,
}

impl MeasurementUnit {
    /// Whether values in this unit are lengths
    pub fn is_length(self) -> bool {
        matches!(self, Self::Millimeters | Self::Pixels)
    }

    /// Unit actually reported once calibration state is known.
    ///
    /// Lengths declared in millimetres fall back to pixels on an
    /// uncalibrated image; every other unit is unaffected.
    pub fn resolve(self, calibrated: bool) -> Self {
        match self {
            Self::Millimeters if !calibrated => Self::Pixels,
            other => other,
        }
    }

    /// Short suffix used in labels
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Millimeters => "mm",
            Self::Degrees => "°",
            Self::Percent => "%",
            Self::Pixels => "px",
        }
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for MeasurementUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mm" | "millimeters" => Ok(Self::Millimeters),
            "°" | "deg" | "degrees" => Ok(Self::Degrees),
            "%" | "percent" => Ok(Self::Percent),
            "px" | "pixels" => Ok(Self::Pixels),
            _ => Err(format!("Unknown measurement unit: {}", s)),
        }
    }
}

/// Format a value with two decimals followed by its unit suffix
pub fn format_value(value: f64, unit: MeasurementUnit) -> String {
    match unit {
        MeasurementUnit::Millimeters | MeasurementUnit::Pixels => {
            format!("{:.2} {}", value, unit)
        }
        _ => format!("{:.2}{}", value, unit),
    }
}
