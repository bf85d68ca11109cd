//! Configuration management
//!
//! Handles loading, saving, and managing application configuration.
//! Configuration is stored as TOML or JSON depending on the file extension.

use crate::error::{SettingsError, SettingsResult};
use cephkit_core::constants::{
    ANGLE_ARC_RADIUS_PX, ANGLE_ARC_SEGMENTS, DEFAULT_FIXED_DISTANCE_MM, HIT_RADIUS_PX,
    LABEL_SIZE_PX, MAGNIFIER_SIZE_PX, MAGNIFIER_ZOOM, POINT_RADIUS_PX,
};
use cephkit_core::ViewportPolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_HISTORY_LIMIT: usize = 50;
const DEFAULT_RECENT_SESSIONS: usize = 10;

/// Viewer behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Letterbox only, or letterbox plus user zoom/pan
    pub viewport_policy: ViewportPolicy,
    /// Hit-test radius in canvas pixels
    pub hit_radius_px: f64,
    pub magnifier_zoom: f64,
    pub magnifier_size_px: u32,
    pub arc_radius_px: f64,
    pub arc_segments: usize,
    /// Maximum undo depth
    pub history_limit: usize,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            viewport_policy: ViewportPolicy::default(),
            hit_radius_px: HIT_RADIUS_PX,
            magnifier_zoom: MAGNIFIER_ZOOM,
            magnifier_size_px: MAGNIFIER_SIZE_PX,
            arc_radius_px: ANGLE_ARC_RADIUS_PX,
            arc_segments: ANGLE_ARC_SEGMENTS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Calibration defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Ruler distance used by fixed-distance projections (10 or 30)
    pub default_fixed_distance_mm: u32,
    /// Reference object sizes in millimetres, keyed by object name
    /// (`implant`, `crown`, `interdental_distance`)
    pub reference_sizes_mm: BTreeMap<String, f64>,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        let reference_sizes_mm = [("implant", 10.0), ("crown", 8.0), ("interdental_distance", 15.0)]
            .into_iter()
            .map(|(name, size)| (name.to_string(), size))
            .collect();
        Self {
            default_fixed_distance_mm: DEFAULT_FIXED_DISTANCE_MM,
            reference_sizes_mm,
        }
    }
}

impl CalibrationSettings {
    /// Configured size for a reference object, if any
    pub fn reference_size(&self, name: &str) -> Option<f64> {
        self.reference_sizes_mm.get(name).copied()
    }
}

/// Annotation rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderingSettings {
    pub point_radius_px: f32,
    pub label_size_px: f32,
    pub show_labels: bool,
}

impl Default for RenderingSettings {
    fn default() -> Self {
        Self {
            point_radius_px: POINT_RADIUS_PX,
            label_size_px: LABEL_SIZE_PX,
            show_labels: true,
        }
    }
}

fn default_max_recent_sessions() -> usize {
    DEFAULT_RECENT_SESSIONS
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Recently saved or opened session snapshots, most recent first
    #[serde(default)]
    pub recent_sessions: Vec<PathBuf>,

    #[serde(default = "default_max_recent_sessions")]
    pub max_recent_sessions: usize,

    #[serde(default)]
    pub viewer: ViewerSettings,

    #[serde(default)]
    pub calibration: CalibrationSettings,

    #[serde(default)]
    pub rendering: RenderingSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recent_sessions: Vec::new(),
            max_recent_sessions: DEFAULT_RECENT_SESSIONS,
            viewer: ViewerSettings::default(),
            calibration: CalibrationSettings::default(),
            rendering: RenderingSettings::default(),
        }
    }
}

impl Config {
    /// Create new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = fs::read_to_string(path)?;

        let config: Config = match Format::of(path)? {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Save configuration to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match Format::of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(path, content)?;
        tracing::info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Load from `path` when it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let viewer = &self.viewer;
        if !(viewer.hit_radius_px.is_finite() && viewer.hit_radius_px > 0.0) {
            return Err(SettingsError::invalid("viewer.hit_radius_px", "must be positive"));
        }
        if !(viewer.magnifier_zoom.is_finite() && viewer.magnifier_zoom >= 1.0) {
            return Err(SettingsError::invalid("viewer.magnifier_zoom", "must be at least 1"));
        }
        if viewer.magnifier_size_px == 0 {
            return Err(SettingsError::invalid("viewer.magnifier_size_px", "must be positive"));
        }
        if !(viewer.arc_radius_px.is_finite() && viewer.arc_radius_px > 0.0) {
            return Err(SettingsError::invalid("viewer.arc_radius_px", "must be positive"));
        }
        if viewer.arc_segments < 2 {
            return Err(SettingsError::invalid("viewer.arc_segments", "must be at least 2"));
        }
        if viewer.history_limit == 0 {
            return Err(SettingsError::invalid("viewer.history_limit", "must be positive"));
        }

        let calibration = &self.calibration;
        if !matches!(calibration.default_fixed_distance_mm, 10 | 30) {
            return Err(SettingsError::invalid(
                "calibration.default_fixed_distance_mm",
                format!("{} mm is not offered (10 or 30)", calibration.default_fixed_distance_mm),
            ));
        }
        for (name, size) in &calibration.reference_sizes_mm {
            if !(size.is_finite() && *size > 0.0) {
                return Err(SettingsError::invalid(
                    &format!("calibration.reference_sizes_mm.{name}"),
                    "must be positive",
                ));
            }
        }

        let rendering = &self.rendering;
        if !(rendering.point_radius_px.is_finite() && rendering.point_radius_px > 0.0) {
            return Err(SettingsError::invalid("rendering.point_radius_px", "must be positive"));
        }
        if !(rendering.label_size_px.is_finite() && rendering.label_size_px > 0.0) {
            return Err(SettingsError::invalid("rendering.label_size_px", "must be positive"));
        }

        Ok(())
    }

    /// Record a session path at the head of the recent list
    pub fn add_recent_session(&mut self, path: PathBuf) {
        self.recent_sessions.retain(|p| p != &path);
        self.recent_sessions.insert(0, path);
        self.recent_sessions.truncate(self.max_recent_sessions);
    }

    /// Drop recent entries whose files no longer exist
    pub fn prune_recent_sessions(&mut self) {
        self.recent_sessions.retain(|p| p.exists());
    }

    /// Overlay `other` on top of this configuration.
    ///
    /// Sections are replaced wholesale; reference sizes are merged key by
    /// key and recent sessions from `other` are put in front.
    pub fn merge(&mut self, other: &Config) {
        self.viewer = other.viewer.clone();
        self.rendering = other.rendering.clone();
        self.calibration.default_fixed_distance_mm = other.calibration.default_fixed_distance_mm;
        for (name, size) in &other.calibration.reference_sizes_mm {
            self.calibration.reference_sizes_mm.insert(name.clone(), *size);
        }
        self.max_recent_sessions = other.max_recent_sessions;
        for path in other.recent_sessions.iter().rev() {
            self.add_recent_session(path.clone());
        }
    }
}

/// Location of the user configuration file
pub fn default_config_path() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("cephkit").join("config.toml"))
        .ok_or_else(|| SettingsError::ConfigDirectory("no configuration directory for this platform".into()))
}

enum Format {
    Json,
    Toml,
}

impl Format {
    fn of(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}
