//! Engine-wide defaults.

/// Hit-test radius around a landmark, in canvas pixels
pub const HIT_RADIUS_PX: f64 = 15.0;

/// Scale reported by an uncalibrated image (px per mm)
pub const UNCALIBRATED_SCALE: f64 = 1.0;

/// Lower bound for the optional user zoom layer
pub const MIN_USER_ZOOM: f64 = 0.2;

/// Upper bound for the optional user zoom layer
pub const MAX_USER_ZOOM: f64 = 5.0;

/// Multiplicative step applied by zoom in/out
pub const USER_ZOOM_STEP: f64 = 1.2;

/// Pan step used by keyboard panning, in canvas pixels
pub const PAN_STEP_PX: f64 = 10.0;

/// Default magnification of the magnifier inset
pub const MAGNIFIER_ZOOM: f64 = 2.0;

/// Default edge length of the square magnifier inset, in pixels
pub const MAGNIFIER_SIZE_PX: u32 = 200;

/// Radius of angle arcs, in canvas pixels
pub const ANGLE_ARC_RADIUS_PX: f64 = 30.0;

/// Number of segments used to approximate an angle arc
pub const ANGLE_ARC_SEGMENTS: usize = 20;

/// Radius of a landmark marker, in canvas pixels
pub const POINT_RADIUS_PX: f32 = 4.0;

/// Label glyph height, in canvas pixels
pub const LABEL_SIZE_PX: f32 = 14.0;

/// Default fixed calibration distance in millimetres
pub const DEFAULT_FIXED_DISTANCE_MM: u32 = 10;
