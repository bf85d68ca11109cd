//! Interaction tools and the input vocabulary routed to them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which interaction a primary click triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    /// Pick and drag existing landmarks
    #[default]
    Select,
    /// Capture calibration reference points
    Calibrate,
    /// Place the next unplaced landmark
    PlacePoint,
    /// Drop freeform markers
    Annotate,
}

impl ToolMode {
    /// Tool needs a raster on screen.
    pub fn requires_raster(self) -> bool {
        matches!(self, Self::Calibrate | Self::PlacePoint | Self::Annotate)
    }

    /// Tool is gated on a completed calibration.
    pub fn requires_calibration(self) -> bool {
        matches!(self, Self::PlacePoint)
    }
}

impl fmt::Display for ToolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "Select"),
            Self::Calibrate => write!(f, "Calibrate"),
            Self::PlacePoint => write!(f, "Place point"),
            Self::Annotate => write!(f, "Annotate"),
        }
    }
}

impl FromStr for ToolMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "select" => Ok(Self::Select),
            "calibrate" | "calibration" => Ok(Self::Calibrate),
            "point" | "place_point" | "placepoint" => Ok(Self::PlacePoint),
            "annotate" | "annotation" => Ok(Self::Annotate),
            _ => Err(format!("Unknown tool: {}", s)),
        }
    }
}

/// Pointer button of a press event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    /// Context button; its default menu is suppressed by the host
    Secondary,
    Middle,
}

/// Keys the engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
}
