//! Viewport policy shared by the engine and the settings layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the canvas maps onto the image.
///
/// Chosen once per engine instance. `FitOnly` keeps the letterbox fit as the
/// only transform; `FitWithUserZoom` layers a user zoom/pan on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewportPolicy {
    /// Letterbox fit only
    #[default]
    FitOnly,
    /// Letterbox fit with an independent user zoom/pan layer
    FitWithUserZoom,
}

impl ViewportPolicy {
    /// Whether zoom/pan commands have any effect
    pub fn allows_user_zoom(self) -> bool {
        matches!(self, Self::FitWithUserZoom)
    }
}

impl fmt::Display for ViewportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FitOnly => write!(f, "fit_only"),
            Self::FitWithUserZoom => write!(f, "fit_with_user_zoom"),
        }
    }
}

impl FromStr for ViewportPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fit_only" | "fit" => Ok(Self::FitOnly),
            "fit_with_user_zoom" | "zoom" => Ok(Self::FitWithUserZoom),
            _ => Err(format!("Unknown viewport policy: {}", s)),
        }
    }
}
