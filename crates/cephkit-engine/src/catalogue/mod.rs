//! Projection configurations.
//!
//! A [`ProjectionConfig`] is everything that differs between imaging
//! modules: the ordered landmark list, derived landmarks, the measurement
//! table, overlay definitions and calibration defaults. The engine itself
//! has no per-projection branches, so new projections are added as data,
//! either through [`Catalogue::builtin`] or a JSON document.

pub mod cephalometry;
pub mod ct;
pub mod formula;
pub mod photometry;

use std::collections::BTreeSet;
use std::fmt;

use cephkit_core::{InputError, MeasurementUnit, ViewportPolicy};
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationMode;
use crate::point_store::PointStore;

pub use formula::{Classification, Classifier, Deviation, Formula, LandmarkLookup};

/// Imaging module a projection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Cephalometry,
    Photometry,
    Ct,
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cephalometry => write!(f, "Cephalometry"),
            Self::Photometry => write!(f, "Photometry"),
            Self::Ct => write!(f, "CT"),
        }
    }
}

/// 8-bit RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkDef {
    pub id: String,
    pub description: String,
}

/// Landmark computed as the midpoint of two others
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedLandmark {
    pub id: String,
    pub between: [String; 2],
}

/// One row of a measurement table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementDef {
    pub key: String,
    pub name: String,
    pub formula: Formula,
    pub unit: MeasurementUnit,
    #[serde(default)]
    pub classifier: Option<Classifier>,
    /// Norm text shown when there is no classifier
    #[serde(default)]
    pub norm: Option<String>,
    /// Anatomical convention behind the formula, where one applies
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

impl MeasurementDef {
    pub fn new(key: &str, name: &str, formula: Formula, unit: MeasurementUnit) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            formula,
            unit,
            classifier: None,
            norm: None,
            note: None,
            group: None,
        }
    }

    pub fn classified(mut self, classifier: Classifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_norm(mut self, norm: &str) -> Self {
        self.norm = Some(norm.to_string());
        self
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }

    pub fn in_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    /// Landmarks needed by the formula and its classifier.
    pub fn required_landmarks(&self) -> BTreeSet<String> {
        let mut req = self.formula.required_landmarks();
        if let Some(c) = &self.classifier {
            req.extend(c.required_landmarks());
        }
        req
    }
}

/// Straight anatomical line between two landmarks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceLine {
    pub key: String,
    pub label: String,
    pub from: String,
    pub to: String,
    pub color: Rgba,
    pub width: f32,
}

/// Angle drawn as two rays and an arc
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleOverlay {
    pub key: String,
    pub label: String,
    pub arm1: String,
    pub vertex: String,
    pub arm2: String,
    pub color: Rgba,
    pub width: f32,
}

/// Everything the engine needs to know about one projection type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    pub key: String,
    pub module: Module,
    pub label: String,
    pub landmarks: Vec<LandmarkDef>,
    #[serde(default)]
    pub derived: Vec<DerivedLandmark>,
    #[serde(default)]
    pub measurements: Vec<MeasurementDef>,
    #[serde(default)]
    pub reference_lines: Vec<ReferenceLine>,
    #[serde(default)]
    pub angle_overlays: Vec<AngleOverlay>,
    #[serde(default)]
    pub calibration: CalibrationMode,
    /// Viewport policy this projection's viewer traditionally uses
    #[serde(default)]
    pub preferred_viewport: ViewportPolicy,
}

impl ProjectionConfig {
    pub fn new(key: &str, module: Module, label: &str) -> Self {
        Self {
            key: key.to_string(),
            module,
            label: label.to_string(),
            landmarks: Vec::new(),
            derived: Vec::new(),
            measurements: Vec::new(),
            reference_lines: Vec::new(),
            angle_overlays: Vec::new(),
            calibration: CalibrationMode::default(),
            preferred_viewport: ViewportPolicy::FitOnly,
        }
    }

    /// Appends landmarks given as `(id, description)` pairs.
    pub fn with_landmarks(mut self, items: &[(&str, &str)]) -> Self {
        self.landmarks.extend(items.iter().map(|(id, description)| LandmarkDef {
            id: id.to_string(),
            description: description.to_string(),
        }));
        self
    }

    pub fn with_derived(mut self, id: &str, a: &str, b: &str) -> Self {
        self.derived.push(DerivedLandmark {
            id: id.to_string(),
            between: [a.to_string(), b.to_string()],
        });
        self
    }

    pub fn with_calibration(mut self, mode: CalibrationMode) -> Self {
        self.calibration = mode;
        self
    }

    pub fn with_viewport(mut self, policy: ViewportPolicy) -> Self {
        self.preferred_viewport = policy;
        self
    }

    pub fn with_measurements(mut self, defs: Vec<MeasurementDef>) -> Self {
        self.measurements.extend(defs);
        self
    }

    pub fn with_line(mut self, key: &str, label: &str, from: &str, to: &str, color: Rgba) -> Self {
        self.reference_lines.push(ReferenceLine {
            key: key.to_string(),
            label: label.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            color,
            width: 2.0,
        });
        self
    }

    pub fn with_angle(mut self, key: &str, label: &str, [arm1, vertex, arm2]: [&str; 3], color: Rgba) -> Self {
        self.angle_overlays.push(AngleOverlay {
            key: key.to_string(),
            label: label.to_string(),
            arm1: arm1.to_string(),
            vertex: vertex.to_string(),
            arm2: arm2.to_string(),
            color,
            width: 2.0,
        });
        self
    }

    pub fn landmark(&self, id: &str) -> Option<&LandmarkDef> {
        self.landmarks.iter().find(|l| l.id == id)
    }

    pub fn derived_rule(&self, id: &str) -> Option<&DerivedLandmark> {
        self.derived.iter().find(|d| d.id == id)
    }

    pub fn reference_line(&self, key: &str) -> Option<&ReferenceLine> {
        self.reference_lines.iter().find(|l| l.key == key)
    }

    pub fn angle_overlay(&self, key: &str) -> Option<&AngleOverlay> {
        self.angle_overlays.iter().find(|a| a.key == key)
    }

    /// First landmark in definition order that still has to be placed by
    /// hand. Placed landmarks are skipped, as are derived landmarks whose
    /// dependencies both exist.
    pub fn next_to_place(&self, store: &PointStore) -> Option<&LandmarkDef> {
        self.landmarks.iter().find(|l| {
            if store.contains(&l.id) {
                return false;
            }
            !self
                .derived_rule(&l.id)
                .is_some_and(|rule| rule.between.iter().all(|dep| store.contains(dep)))
        })
    }

    /// Landmarks not yet placed, in definition order.
    pub fn remaining(&self, store: &PointStore) -> Vec<&LandmarkDef> {
        self.landmarks.iter().filter(|l| !store.contains(&l.id)).collect()
    }

    /// Derived landmark whose dependencies are all placed. Such landmarks
    /// follow their dependencies and cannot be removed on their own.
    pub fn is_managed(&self, id: &str, store: &PointStore) -> bool {
        self.derived_rule(id)
            .is_some_and(|rule| rule.between.iter().all(|dep| store.contains(dep)))
    }

    /// Most recently added landmark that may be removed directly.
    pub fn last_removable(&self, store: &PointStore) -> Option<String> {
        store
            .history()
            .iter()
            .rev()
            .find(|id| !self.is_managed(id, store))
            .cloned()
    }

    /// Removes a landmark together with any derived landmark built on it.
    ///
    /// Managed derived landmarks are left alone. Returns the removed ids,
    /// the requested one first.
    pub fn remove_landmark(&self, store: &mut PointStore, id: &str) -> Vec<String> {
        if self.is_managed(id, store) || store.remove(id).is_none() {
            return Vec::new();
        }
        let mut removed = vec![id.to_string()];
        for rule in self.derived.iter().filter(|r| r.between.iter().any(|dep| dep == id)) {
            if store.remove(&rule.id).is_some() {
                removed.push(rule.id.clone());
            }
        }
        removed
    }

    /// Recomputes every derived landmark whose dependencies exist.
    ///
    /// Returns the ids that were added or moved.
    pub fn refresh_derived(&self, store: &mut PointStore) -> Vec<String> {
        let mut changed = Vec::new();
        for rule in &self.derived {
            let (Some(a), Some(b)) = (store.get(&rule.between[0]), store.get(&rule.between[1])) else {
                continue;
            };
            let mid = a.midpoint(&b);
            if store.get(&rule.id) != Some(mid) {
                store.insert(&rule.id, mid);
                changed.push(rule.id.clone());
            }
        }
        changed
    }

    /// Checks internal consistency: unique ids and no dangling references.
    pub fn validate(&self) -> Result<(), String> {
        let mut seen = BTreeSet::new();
        for l in &self.landmarks {
            if !seen.insert(l.id.as_str()) {
                return Err(format!("{}: duplicate landmark '{}'", self.key, l.id));
            }
        }
        let known = |id: &str| seen.contains(id);
        for d in &self.derived {
            if !known(&d.id) || !d.between.iter().all(|dep| known(dep)) {
                return Err(format!("{}: derived landmark '{}' references unknown ids", self.key, d.id));
            }
        }
        for m in &self.measurements {
            if let Some(missing) = m.required_landmarks().iter().find(|id| !known(id)) {
                return Err(format!("{}: measurement '{}' uses unknown landmark '{}'", self.key, m.key, missing));
            }
        }
        for l in &self.reference_lines {
            if !known(&l.from) || !known(&l.to) {
                return Err(format!("{}: reference line '{}' uses unknown landmarks", self.key, l.key));
            }
        }
        for a in &self.angle_overlays {
            if ![&a.arm1, &a.vertex, &a.arm2].iter().all(|id| known(id)) {
                return Err(format!("{}: angle overlay '{}' uses unknown landmarks", self.key, a.key));
            }
        }
        self.calibration.validate().map_err(|e| format!("{}: {}", self.key, e))
    }
}

/// Set of projection configurations available to an engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Catalogue {
    projections: Vec<ProjectionConfig>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// All projections shipped with cephkit.
    pub fn builtin() -> Self {
        let mut catalogue = Self::new();
        for config in cephalometry::projections()
            .into_iter()
            .chain(photometry::projections())
            .chain(ct::projections())
        {
            catalogue.insert(config);
        }
        catalogue
    }

    /// Loads a catalogue from JSON and validates every projection.
    pub fn from_json(json: &str) -> cephkit_core::Result<Self> {
        let catalogue: Self = serde_json::from_str(json)?;
        catalogue.validate().map_err(cephkit_core::Error::other)?;
        Ok(catalogue)
    }

    pub fn to_json(&self) -> cephkit_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Adds a projection, replacing any with the same key.
    pub fn insert(&mut self, config: ProjectionConfig) {
        match self.projections.iter_mut().find(|p| p.key == config.key) {
            Some(existing) => *existing = config,
            None => self.projections.push(config),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ProjectionConfig> {
        self.projections.iter().find(|p| p.key == key)
    }

    /// Like [`Catalogue::get`] but reports unknown keys as input errors.
    pub fn require(&self, key: &str) -> Result<&ProjectionConfig, InputError> {
        self.get(key).ok_or_else(|| InputError::UnknownProjection {
            projection: key.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProjectionConfig> {
        self.projections.iter()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.projections.iter().map(|p| p.key.as_str()).collect()
    }

    pub fn by_module(&self, module: Module) -> Vec<&ProjectionConfig> {
        self.projections.iter().filter(|p| p.module == module).collect()
    }

    pub fn len(&self) -> usize {
        self.projections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }

    pub fn validate(&self) -> Result<(), String> {
        self.projections.iter().try_for_each(ProjectionConfig::validate)
    }
}
