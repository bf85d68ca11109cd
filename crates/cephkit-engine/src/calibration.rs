//! Pixel-to-millimetre calibration.
//!
//! A calibration captures two image-space points a known physical distance
//! apart and derives `scale` in px/mm. Until both points are captured the
//! scale stays at the uncalibrated sentinel.

use std::fmt;

use cephkit_core::constants::UNCALIBRATED_SCALE;
use cephkit_core::InputError;
use serde::{Deserialize, Serialize};

use crate::model::Point;

/// Known distances offered by the ruler-style calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixedDistance {
    #[serde(rename = "10mm")]
    Ten,
    #[serde(rename = "30mm")]
    Thirty,
}

impl FixedDistance {
    pub fn millimeters(self) -> f64 {
        match self {
            Self::Ten => 10.0,
            Self::Thirty => 30.0,
        }
    }

    pub fn from_millimeters(mm: u32) -> Option<Self> {
        match mm {
            10 => Some(Self::Ten),
            30 => Some(Self::Thirty),
            _ => None,
        }
    }
}

/// Physical objects usable as a calibration reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceObject {
    Implant,
    Crown,
    InterdentalDistance,
    Custom,
}

impl ReferenceObject {
    /// Catalogue size in millimetres; `None` for a user-entered size.
    pub fn default_size_mm(self) -> Option<f64> {
        match self {
            Self::Implant => Some(10.0),
            Self::Crown => Some(8.0),
            Self::InterdentalDistance => Some(15.0),
            Self::Custom => None,
        }
    }
}

impl fmt::Display for ReferenceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Implant => write!(f, "Implant"),
            Self::Crown => write!(f, "Crown"),
            Self::InterdentalDistance => write!(f, "Interdental distance"),
            Self::Custom => write!(f, "Custom"),
        }
    }
}

/// DICOM-style physical pixel spacing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelSpacing {
    pub row_mm: f64,
    pub col_mm: f64,
}

impl PixelSpacing {
    /// Mean spacing, if both components are usable.
    pub fn mean_mm(&self) -> Option<f64> {
        let mean = (self.row_mm + self.col_mm) / 2.0;
        (self.row_mm > 0.0 && self.col_mm > 0.0 && mean.is_finite()).then_some(mean)
    }
}

/// How the physical reference distance is obtained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalibrationMode {
    /// Ruler marks a fixed distance apart
    FixedDistance { distance: FixedDistance },
    /// Object of known size visible in the image
    ReferenceObject { object: ReferenceObject, size_mm: f64 },
    /// Spacing reported by the image source; no points are picked
    PixelSpacing { spacing: PixelSpacing },
}

impl CalibrationMode {
    /// Reference-object mode with its catalogue size.
    ///
    /// `Custom` has no catalogue size and must go through
    /// [`CalibrationMode::custom_object`].
    pub fn reference(object: ReferenceObject) -> Result<Self, InputError> {
        let size_mm = object
            .default_size_mm()
            .ok_or(InputError::NonPositiveObjectSize { size_mm: 0.0 })?;
        Ok(Self::ReferenceObject { object, size_mm })
    }

    /// Reference-object mode with a user-entered size.
    pub fn custom_object(size_mm: f64) -> Result<Self, InputError> {
        let mode = Self::ReferenceObject {
            object: ReferenceObject::Custom,
            size_mm,
        };
        mode.validate()?;
        Ok(mode)
    }

    /// Rejects non-positive reference sizes.
    pub fn validate(&self) -> Result<(), InputError> {
        match self {
            Self::ReferenceObject { size_mm, .. } if !(size_mm.is_finite() && *size_mm > 0.0) => {
                Err(InputError::NonPositiveObjectSize { size_mm: *size_mm })
            }
            Self::PixelSpacing { spacing } if spacing.mean_mm().is_none() => {
                Err(InputError::InvalidRaster {
                    reason: "pixel spacing must be positive".to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Physical distance between the two calibration points.
    pub fn known_distance_mm(&self) -> Option<f64> {
        match self {
            Self::FixedDistance { distance } => Some(distance.millimeters()),
            Self::ReferenceObject { size_mm, .. } => Some(*size_mm),
            Self::PixelSpacing { .. } => None,
        }
    }

    /// Labels for the two calibration markers, as drawn on the image.
    pub fn point_labels(&self) -> [&'static str; 2] {
        match self {
            Self::FixedDistance {
                distance: FixedDistance::Ten,
            } => ["0", "10"],
            Self::FixedDistance {
                distance: FixedDistance::Thirty,
            } => ["0", "30"],
            _ => ["1", "2"],
        }
    }
}

impl Default for CalibrationMode {
    fn default() -> Self {
        Self::FixedDistance {
            distance: FixedDistance::Ten,
        }
    }
}

impl fmt::Display for CalibrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedDistance { distance } => {
                write!(f, "Fixed distance {} mm", distance.millimeters())
            }
            Self::ReferenceObject { object, size_mm } => {
                write!(f, "{} ({} mm)", object, size_mm)
            }
            Self::PixelSpacing { spacing } => {
                write!(f, "Pixel spacing {}x{} mm", spacing.row_mm, spacing.col_mm)
            }
        }
    }
}

/// What a captured calibration click did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureOutcome {
    /// First reference point stored
    FirstPoint,
    /// Second point stored and scale computed
    Completed { scale: f64 },
    /// Calibration was already complete; the click was ignored
    AlreadyComplete,
}

/// Calibration state of one projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    mode: CalibrationMode,
    point1: Option<Point>,
    point2: Option<Point>,
    scale: f64,
    #[serde(default)]
    complete: bool,
}

impl CalibrationState {
    pub fn new(mode: CalibrationMode) -> Self {
        Self {
            mode,
            point1: None,
            point2: None,
            scale: UNCALIBRATED_SCALE,
            complete: false,
        }
    }

    pub fn mode(&self) -> &CalibrationMode {
        &self.mode
    }

    pub fn point1(&self) -> Option<Point> {
        self.point1
    }

    pub fn point2(&self) -> Option<Point> {
        self.point2
    }

    /// Captured points in capture order.
    pub fn points(&self) -> Vec<Point> {
        self.point1.into_iter().chain(self.point2).collect()
    }

    /// px/mm; the uncalibrated sentinel until calibration completes.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Both reference points captured and scale derived.
    pub fn is_calibrated(&self) -> bool {
        self.complete
    }

    /// Exactly one point captured.
    pub fn is_in_progress(&self) -> bool {
        self.point1.is_some() && !self.complete
    }

    /// Switches mode and discards any calibration made in the old one.
    pub fn set_mode(&mut self, mode: CalibrationMode) -> Result<(), InputError> {
        mode.validate()?;
        self.mode = mode;
        self.reset();
        Ok(())
    }

    /// Changes the reference object size, keeping the object kind.
    pub fn set_object_size(&mut self, size_mm: f64) -> Result<(), InputError> {
        let object = match self.mode {
            CalibrationMode::ReferenceObject { object, .. } => object,
            _ => ReferenceObject::Custom,
        };
        self.set_mode(CalibrationMode::ReferenceObject { object, size_mm })
    }

    /// Records a clicked reference point.
    pub fn capture(&mut self, point: Point) -> Result<CaptureOutcome, InputError> {
        if self.complete {
            return Ok(CaptureOutcome::AlreadyComplete);
        }
        let Some(known_mm) = self.mode.known_distance_mm() else {
            return Err(InputError::NotCalibrated);
        };
        match self.point1 {
            None => {
                self.point1 = Some(point);
                Ok(CaptureOutcome::FirstPoint)
            }
            Some(first) => {
                let px = first.distance_to(&point);
                if px <= f64::EPSILON {
                    return Err(InputError::CoincidentCalibrationPoints);
                }
                self.point2 = Some(point);
                self.scale = px / known_mm;
                self.complete = true;
                Ok(CaptureOutcome::Completed { scale: self.scale })
            }
        }
    }

    /// Completes calibration from source pixel spacing: `1 / mean spacing`.
    pub fn calibrate_from_spacing(&mut self, spacing: PixelSpacing) -> Result<f64, InputError> {
        let mode = CalibrationMode::PixelSpacing { spacing };
        mode.validate()?;
        let mean = spacing.mean_mm().ok_or(InputError::NotCalibrated)?;
        self.mode = mode;
        self.point1 = None;
        self.point2 = None;
        self.scale = 1.0 / mean;
        self.complete = true;
        Ok(self.scale)
    }

    /// Clears captured points and returns to the uncalibrated sentinel.
    pub fn reset(&mut self) {
        self.point1 = None;
        self.point2 = None;
        self.scale = UNCALIBRATED_SCALE;
        self.complete = false;
    }

    /// Rebuilds a state from persisted parts.
    pub fn restore(mode: CalibrationMode, points: &[Point], scale: f64) -> Result<Self, InputError> {
        mode.validate()?;
        let mut state = Self::new(mode);
        state.point1 = points.first().copied();
        state.point2 = points.get(1).copied();
        let spacing_mode = matches!(mode, CalibrationMode::PixelSpacing { .. });
        if (state.point2.is_some() || spacing_mode) && scale.is_finite() && scale > 0.0 {
            state.scale = scale;
            state.complete = true;
        }
        Ok(state)
    }

    /// Converts a pixel length into millimetres with the current scale.
    pub fn px_to_mm(&self, px: f64) -> f64 {
        px / self.scale
    }
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self::new(CalibrationMode::default())
    }
}
