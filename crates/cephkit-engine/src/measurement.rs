//! Measurement evaluation.
//!
//! Measurements are derived on request from the landmarks and the
//! calibration; they are never stored as independent state.

use cephkit_core::{format_value, MeasurementUnit};
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationState;
use crate::catalogue::{Deviation, LandmarkLookup, MeasurementDef, ProjectionConfig};

/// A computed measurement with its interpretation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub key: String,
    pub name: String,
    pub value: f64,
    pub unit: MeasurementUnit,
    pub interpretation: Option<String>,
    pub deviation: Option<Deviation>,
    pub norm_range_text: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl Measurement {
    /// Value with unit, e.g. `"82.00°"`.
    pub fn formatted_value(&self) -> String {
        format_value(self.value, self.unit)
    }

    /// Within norm, or has no norm to compare against.
    pub fn is_normal(&self) -> bool {
        self.deviation.is_none_or(|d| d == Deviation::Within)
    }
}

/// Evaluates one catalogue entry.
///
/// Returns `None` when a required landmark is missing or the geometry is
/// degenerate.
pub fn evaluate(def: &MeasurementDef, points: &dyn LandmarkLookup, calibration: &CalibrationState) -> Option<Measurement> {
    if def.required_landmarks().iter().any(|id| points.landmark(id).is_none()) {
        return None;
    }
    let scale = calibration.scale();
    let value = def.formula.evaluate(points, scale)?;
    let unit = def.unit.resolve(calibration.is_calibrated());
    let classification = def
        .classifier
        .as_ref()
        .and_then(|c| c.classify(value, unit, points, scale));

    Some(Measurement {
        key: def.key.clone(),
        name: def.name.clone(),
        value,
        unit,
        interpretation: classification.as_ref().map(|c| c.label.clone()),
        deviation: classification.as_ref().map(|c| c.deviation),
        norm_range_text: classification.map(|c| c.norm_text).or_else(|| def.norm.clone()),
        group: def.group.clone(),
    })
}

/// Evaluates every measurement of a projection in table order, skipping
/// those that cannot be computed yet.
pub fn evaluate_all(
    config: &ProjectionConfig,
    points: &dyn LandmarkLookup,
    calibration: &CalibrationState,
) -> Vec<Measurement> {
    config
        .measurements
        .iter()
        .filter_map(|def| evaluate(def, points, calibration))
        .collect()
}
