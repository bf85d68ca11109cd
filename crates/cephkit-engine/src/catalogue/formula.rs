//! Declarative measurement formulas and norm classifiers.
//!
//! A [`Formula`] is a small expression tree over landmark ids. It knows
//! which landmarks it needs, so a catalogue entry never lists them twice.

use std::collections::BTreeSet;

use cephkit_core::MeasurementUnit;
use serde::{Deserialize, Serialize};

use crate::geometry;
use crate::model::Point;

/// Looks up landmark coordinates by id
pub trait LandmarkLookup {
    fn landmark(&self, id: &str) -> Option<Point>;
}

impl LandmarkLookup for crate::point_store::PointStore {
    fn landmark(&self, id: &str) -> Option<Point> {
        self.get(id)
    }
}

impl LandmarkLookup for std::collections::HashMap<String, Point> {
    fn landmark(&self, id: &str) -> Option<Point> {
        self.get(id).copied()
    }
}

/// Expression computing a measurement value from landmarks.
///
/// Lengths are scaled to millimetres with the calibration scale; angles
/// are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Formula {
    /// Length of the segment between two landmarks
    Distance { from: String, to: String },
    /// Angle at `vertex` between the rays to `arm1` and `arm2`
    Angle {
        arm1: String,
        vertex: String,
        arm2: String,
    },
    /// Angle between two directed lines. With `supplement` the value is
    /// reported as `180 - angle`.
    LineAngle {
        line1: [String; 2],
        line2: [String; 2],
        #[serde(default)]
        supplement: bool,
    },
    /// Angle at `vertex` between the ray to `arm` and the ray to the foot
    /// of the perpendicular dropped from `foot_of` onto `line`
    AngleToFoot {
        arm: String,
        vertex: String,
        foot_of: String,
        line: [String; 2],
    },
    /// Distance between the feet of `from` and `to` on `line`
    ProjectedDistance {
        from: String,
        to: String,
        line: [String; 2],
        #[serde(default)]
        signed: bool,
    },
    /// `numerator / denominator * factor`
    Ratio {
        numerator: Box<Formula>,
        denominator: Box<Formula>,
        factor: f64,
    },
    Sum { terms: Vec<Formula> },
    Difference {
        minuend: Box<Formula>,
        subtrahend: Box<Formula>,
    },
    /// `of * factor + offset`
    Scaled {
        of: Box<Formula>,
        factor: f64,
        #[serde(default)]
        offset: f64,
    },
}

impl Formula {
    pub fn distance(from: &str, to: &str) -> Self {
        Self::Distance {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn angle(arm1: &str, vertex: &str, arm2: &str) -> Self {
        Self::Angle {
            arm1: arm1.to_string(),
            vertex: vertex.to_string(),
            arm2: arm2.to_string(),
        }
    }

    pub fn line_angle(line1: [&str; 2], line2: [&str; 2], supplement: bool) -> Self {
        Self::LineAngle {
            line1: line1.map(str::to_string),
            line2: line2.map(str::to_string),
            supplement,
        }
    }

    pub fn ratio(numerator: Formula, denominator: Formula, factor: f64) -> Self {
        Self::Ratio {
            numerator: Box::new(numerator),
            denominator: Box::new(denominator),
            factor,
        }
    }

    pub fn scaled(of: Formula, factor: f64, offset: f64) -> Self {
        Self::Scaled {
            of: Box::new(of),
            factor,
            offset,
        }
    }

    pub fn difference(minuend: Formula, subtrahend: Formula) -> Self {
        Self::Difference {
            minuend: Box::new(minuend),
            subtrahend: Box::new(subtrahend),
        }
    }

    /// Every landmark id the formula reads.
    pub fn required_landmarks(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_landmarks(&mut out);
        out
    }

    fn collect_landmarks(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Distance { from, to } => {
                out.insert(from.clone());
                out.insert(to.clone());
            }
            Self::Angle { arm1, vertex, arm2 } => {
                out.extend([arm1.clone(), vertex.clone(), arm2.clone()]);
            }
            Self::LineAngle { line1, line2, .. } => {
                out.extend(line1.iter().chain(line2).cloned());
            }
            Self::AngleToFoot {
                arm,
                vertex,
                foot_of,
                line,
            } => {
                out.extend([arm.clone(), vertex.clone(), foot_of.clone()]);
                out.extend(line.iter().cloned());
            }
            Self::ProjectedDistance { from, to, line, .. } => {
                out.extend([from.clone(), to.clone()]);
                out.extend(line.iter().cloned());
            }
            Self::Ratio {
                numerator,
                denominator,
                ..
            } => {
                numerator.collect_landmarks(out);
                denominator.collect_landmarks(out);
            }
            Self::Sum { terms } => terms.iter().for_each(|t| t.collect_landmarks(out)),
            Self::Difference {
                minuend,
                subtrahend,
            } => {
                minuend.collect_landmarks(out);
                subtrahend.collect_landmarks(out);
            }
            Self::Scaled { of, .. } => of.collect_landmarks(out),
        }
    }

    /// Evaluates the formula.
    ///
    /// Returns `None` when a landmark is missing or the geometry is
    /// degenerate (zero-length line, zero denominator).
    pub fn evaluate(&self, points: &dyn LandmarkLookup, scale: f64) -> Option<f64> {
        let p = |id: &str| points.landmark(id);
        let value = match self {
            Self::Distance { from, to } => geometry::distance(&p(from)?, &p(to)?, scale),
            Self::Angle { arm1, vertex, arm2 } => geometry::angle(&p(arm1)?, &p(vertex)?, &p(arm2)?),
            Self::LineAngle {
                line1,
                line2,
                supplement,
            } => {
                let a = geometry::line_angle(&p(&line1[0])?, &p(&line1[1])?, &p(&line2[0])?, &p(&line2[1])?)?;
                if *supplement {
                    180.0 - a
                } else {
                    a
                }
            }
            Self::AngleToFoot {
                arm,
                vertex,
                foot_of,
                line,
            } => {
                let foot = geometry::project_point_on_line(&p(foot_of)?, &p(&line[0])?, &p(&line[1])?)?;
                geometry::angle(&p(arm)?, &p(vertex)?, &foot)
            }
            Self::ProjectedDistance {
                from,
                to,
                line,
                signed,
            } => {
                let d = geometry::projected_distance(&p(from)?, &p(to)?, &p(&line[0])?, &p(&line[1])?, scale)?;
                if *signed {
                    d
                } else {
                    d.abs()
                }
            }
            Self::Ratio {
                numerator,
                denominator,
                factor,
            } => {
                let den = denominator.evaluate(points, scale)?;
                if den.abs() <= f64::EPSILON {
                    return None;
                }
                numerator.evaluate(points, scale)? / den * factor
            }
            Self::Sum { terms } => {
                let mut total = 0.0;
                for term in terms {
                    total += term.evaluate(points, scale)?;
                }
                total
            }
            Self::Difference {
                minuend,
                subtrahend,
            } => minuend.evaluate(points, scale)? - subtrahend.evaluate(points, scale)?,
            Self::Scaled { of, factor, offset } => of.evaluate(points, scale)? * factor + offset,
        };
        value.is_finite().then_some(value)
    }
}

/// Position of a value relative to its norm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deviation {
    Below,
    Within,
    Above,
}

/// Outcome of classifying a value
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub deviation: Deviation,
    pub label: String,
    pub norm_text: String,
}

/// Maps a measured value onto a clinical interpretation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    /// Fixed interval. Values strictly below `low` or strictly above `high`
    /// deviate; with `inclusive` the bounds themselves already deviate.
    Range {
        #[serde(default)]
        low: Option<f64>,
        #[serde(default)]
        high: Option<f64>,
        #[serde(default)]
        inclusive: bool,
        below: String,
        within: String,
        above: String,
    },
    /// Interval around a value computed from other landmarks
    Expected {
        expected: Formula,
        #[serde(default)]
        tolerance: f64,
        below: String,
        within: String,
        above: String,
    },
}

impl Classifier {
    pub fn range(low: f64, high: f64, below: &str, within: &str, above: &str) -> Self {
        Self::Range {
            low: Some(low),
            high: Some(high),
            inclusive: false,
            below: below.to_string(),
            within: within.to_string(),
            above: above.to_string(),
        }
    }

    /// Landmarks needed beyond those of the measured formula.
    pub fn required_landmarks(&self) -> BTreeSet<String> {
        match self {
            Self::Range { .. } => BTreeSet::new(),
            Self::Expected { expected, .. } => expected.required_landmarks(),
        }
    }

    /// Classifies `value`; `None` if the expected value cannot be computed.
    pub fn classify(
        &self,
        value: f64,
        unit: MeasurementUnit,
        points: &dyn LandmarkLookup,
        scale: f64,
    ) -> Option<Classification> {
        match self {
            Self::Range {
                low,
                high,
                inclusive,
                below,
                within,
                above,
            } => {
                let is_below = low.is_some_and(|l| if *inclusive { value <= l } else { value < l });
                let is_above = high.is_some_and(|h| if *inclusive { value >= h } else { value > h });
                let (deviation, label) = if is_below {
                    (Deviation::Below, below)
                } else if is_above {
                    (Deviation::Above, above)
                } else {
                    (Deviation::Within, within)
                };
                Some(Classification {
                    deviation,
                    label: label.clone(),
                    norm_text: range_text(*low, *high, unit),
                })
            }
            Self::Expected {
                expected,
                tolerance,
                below,
                within,
                above,
            } => {
                let target = expected.evaluate(points, scale)?;
                let (deviation, label) = if value < target - tolerance {
                    (Deviation::Below, below)
                } else if value > target + tolerance {
                    (Deviation::Above, above)
                } else {
                    (Deviation::Within, within)
                };
                Some(Classification {
                    deviation,
                    label: label.clone(),
                    norm_text: format!("{:.2}{}", target, unit_suffix(unit)),
                })
            }
        }
    }
}

fn unit_suffix(unit: MeasurementUnit) -> String {
    match unit {
        MeasurementUnit::Millimeters | MeasurementUnit::Pixels => format!(" {}", unit),
        _ => unit.to_string(),
    }
}

fn range_text(low: Option<f64>, high: Option<f64>, unit: MeasurementUnit) -> String {
    let suffix = unit_suffix(unit);
    match (low, high) {
        (Some(l), Some(h)) if l == h => format!("{}{}", l, suffix),
        (Some(l), Some(h)) => format!("{}-{}{}", l, h, suffix),
        (Some(l), None) => format!(">={}{}", l, suffix),
        (None, Some(h)) => format!("<={}{}", h, suffix),
        (None, None) => String::new(),
    }
}
