//! Mapping from the configuration file onto engine and renderer options.

use cephkit_engine::{CalibrationMode, EngineOptions, FixedDistance, ReferenceObject, RenderStyle};
use cephkit_settings::Config;

pub fn engine_options(config: &Config) -> EngineOptions {
    let viewer = &config.viewer;
    EngineOptions {
        viewport_policy: viewer.viewport_policy,
        hit_radius_px: viewer.hit_radius_px,
        magnifier_zoom: viewer.magnifier_zoom,
        magnifier_size_px: viewer.magnifier_size_px,
        history_limit: viewer.history_limit,
    }
}

pub fn render_style(config: &Config) -> RenderStyle {
    RenderStyle {
        point_radius: config.rendering.point_radius_px,
        label_size: config.rendering.label_size_px,
        show_labels: config.rendering.show_labels,
        arc_radius: config.viewer.arc_radius_px,
        arc_segments: config.viewer.arc_segments,
        ..RenderStyle::default()
    }
}

/// Key of a reference object in the configuration size table
pub fn reference_key(object: ReferenceObject) -> &'static str {
    match object {
        ReferenceObject::Implant => "implant",
        ReferenceObject::Crown => "crown",
        ReferenceObject::InterdentalDistance => "interdental_distance",
        ReferenceObject::Custom => "custom",
    }
}

/// Calibration mode a projection should start in under `config`.
///
/// Returns `None` when the catalogue default already matches.
pub fn calibration_mode(config: &Config, catalogue_mode: &CalibrationMode) -> Option<CalibrationMode> {
    let mode = match *catalogue_mode {
        CalibrationMode::FixedDistance { .. } => {
            let distance = FixedDistance::from_millimeters(config.calibration.default_fixed_distance_mm)?;
            CalibrationMode::FixedDistance { distance }
        }
        CalibrationMode::ReferenceObject { object, .. } => {
            let size_mm = config.calibration.reference_size(reference_key(object))?;
            CalibrationMode::ReferenceObject { object, size_mm }
        }
        CalibrationMode::PixelSpacing { .. } => return None,
    };
    (mode != *catalogue_mode).then_some(mode)
}
