//! Session snapshots.
//!
//! A snapshot captures one projection: its ordered landmarks, calibration
//! and annotations, plus a convenience copy of the measurements at save
//! time. Measurements are always recomputed on restore.

use std::path::Path;

use anyhow::Context;
use cephkit_core::SnapshotError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::calibration::{CalibrationMode, CalibrationState};
use crate::controller::ProjectionSession;
use crate::measurement::Measurement;
use crate::model::Point;
use crate::point_store::LandmarkPoint;

/// Current snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: DateTime<Utc>,
    pub application: String,
    /// Raster size at save time, if one was loaded
    #[serde(default)]
    pub image_width: Option<u32>,
    #[serde(default)]
    pub image_height: Option<u32>,
}

impl Default for SnapshotMetadata {
    fn default() -> Self {
        Self {
            created_at: Utc::now(),
            application: format!("cephkit {}", env!("CARGO_PKG_VERSION")),
            image_width: None,
            image_height: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSnapshot {
    pub mode: CalibrationMode,
    pub points: Vec<Point>,
    pub scale: f64,
}

impl From<&CalibrationState> for CalibrationSnapshot {
    fn from(state: &CalibrationState) -> Self {
        Self {
            mode: *state.mode(),
            points: state.points(),
            scale: state.scale(),
        }
    }
}

impl CalibrationSnapshot {
    pub fn to_state(&self) -> Result<CalibrationState, cephkit_core::InputError> {
        CalibrationState::restore(self.mode, &self.points, self.scale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u32,
    pub metadata: SnapshotMetadata,
    pub projection_type: String,
    /// Landmarks in insertion order
    pub points: Vec<LandmarkPoint>,
    pub calibration: CalibrationSnapshot,
    #[serde(default)]
    pub measurements: Vec<Measurement>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl SessionSnapshot {
    pub fn capture(projection: &str, session: &ProjectionSession, measurements: Vec<Measurement>) -> Self {
        let mut metadata = SnapshotMetadata::default();
        if let Some(raster) = &session.raster {
            metadata.image_width = Some(raster.width);
            metadata.image_height = Some(raster.height);
        }
        Self {
            version: SNAPSHOT_FORMAT_VERSION,
            metadata,
            projection_type: projection.to_string(),
            points: session.points.to_ordered(),
            calibration: CalibrationSnapshot::from(&session.calibration),
            measurements,
            annotations: session.annotations.clone(),
        }
    }

    pub fn to_json(&self) -> cephkit_core::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a snapshot and checks its format version.
    pub fn from_json(json: &str) -> cephkit_core::Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    pub fn check_version(&self) -> Result<(), SnapshotError> {
        if self.version == 0 || self.version > SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version.to_string(),
                expected: SNAPSHOT_FORMAT_VERSION.to_string(),
            });
        }
        Ok(())
    }
}

/// Saves a snapshot to a JSON file.
pub fn save_snapshot(snapshot: &SessionSnapshot, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let json = snapshot.to_json()?;
    std::fs::write(path, json).with_context(|| format!("Failed to write snapshot {}", path.display()))?;
    tracing::info!("Saved snapshot to {}", path.display());
    Ok(())
}

/// Loads a snapshot from a JSON file.
pub fn load_snapshot(path: impl AsRef<Path>) -> anyhow::Result<SessionSnapshot> {
    let path = path.as_ref();
    let json =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot =
        SessionSnapshot::from_json(&json).with_context(|| format!("Invalid snapshot {}", path.display()))?;
    Ok(snapshot)
}
