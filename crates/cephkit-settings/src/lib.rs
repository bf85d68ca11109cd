//! cephkit Settings Crate
//!
//! Handles application configuration: viewer behaviour, calibration
//! defaults, rendering style and the recent sessions list.

pub mod config;
pub mod error;

pub use config::{default_config_path, CalibrationSettings, Config, RenderingSettings, ViewerSettings};
pub use error::{SettingsError, SettingsResult};
