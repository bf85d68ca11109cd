//! Commands accepted by the [`Controller`](crate::controller::Controller).
//!
//! Pointer commands are routed through the active tool; the remaining
//! commands act directly and are available regardless of tool.

use uuid::Uuid;

use crate::calibration::CalibrationMode;
use crate::event::EngineEvent;
use crate::model::CanvasPoint;
use crate::tools::{Key, PointerButton, ToolMode};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    SelectTool(ToolMode),
    SetProjection(String),
    ResizeCanvas { width: f64, height: f64 },

    PointerDown { at: CanvasPoint, button: PointerButton },
    PointerMove { at: CanvasPoint },
    PointerUp { at: CanvasPoint },
    /// Pointer left the canvas; ends drags and hides the magnifier
    PointerLeave,
    KeyPress(Key),

    /// Assigns the next unplaced landmark at a canvas position
    PlacePoint { at: CanvasPoint },
    /// Captures a calibration reference point at a canvas position
    Calibrate { at: CanvasPoint },
    SetCalibrationMode(CalibrationMode),
    SetObjectSize(f64),
    ResetCalibration,
    /// Calibrates from the spacing carried by the current raster
    CalibrateFromPixelSpacing,

    SelectPoint(Option<String>),
    DeleteSelected,
    DeleteLast,
    ClearPoints,

    AddAnnotation { at: CanvasPoint, text: Option<String> },
    RemoveAnnotation(Uuid),

    ToggleReferenceLine(String),
    ToggleAngleOverlay(String),
    ToggleMagnifier { at: CanvasPoint },

    ZoomIn,
    ZoomOut,
    PanBy { dx: f64, dy: f64 },
    ResetView,

    Undo,
    Redo,
}

impl EngineCommand {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SelectTool(_) => "select_tool",
            Self::SetProjection(_) => "set_projection",
            Self::ResizeCanvas { .. } => "resize_canvas",
            Self::PointerDown { .. } => "pointer_down",
            Self::PointerMove { .. } => "pointer_move",
            Self::PointerUp { .. } => "pointer_up",
            Self::PointerLeave => "pointer_leave",
            Self::KeyPress(_) => "key_press",
            Self::PlacePoint { .. } => "place_point",
            Self::Calibrate { .. } => "calibrate",
            Self::SetCalibrationMode(_) => "set_calibration_mode",
            Self::SetObjectSize(_) => "set_object_size",
            Self::ResetCalibration => "reset_calibration",
            Self::CalibrateFromPixelSpacing => "calibrate_from_pixel_spacing",
            Self::SelectPoint(_) => "select_point",
            Self::DeleteSelected => "delete_selected",
            Self::DeleteLast => "delete_last",
            Self::ClearPoints => "clear_points",
            Self::AddAnnotation { .. } => "add_annotation",
            Self::RemoveAnnotation(_) => "remove_annotation",
            Self::ToggleReferenceLine(_) => "toggle_reference_line",
            Self::ToggleAngleOverlay(_) => "toggle_angle_overlay",
            Self::ToggleMagnifier { .. } => "toggle_magnifier",
            Self::ZoomIn => "zoom_in",
            Self::ZoomOut => "zoom_out",
            Self::PanBy { .. } => "pan_by",
            Self::ResetView => "reset_view",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }

    /// High-frequency commands that are logged at trace level only.
    pub fn is_motion(&self) -> bool {
        matches!(self, Self::PointerMove { .. })
    }
}

/// Result of a successfully applied command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutcome {
    pub events: Vec<EngineEvent>,
    /// Something visible changed and the host should render
    pub redraw: bool,
}

impl CommandOutcome {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn redraw(events: Vec<EngineEvent>) -> Self {
        Self { events, redraw: true }
    }

    pub fn has_event(&self, predicate: impl Fn(&EngineEvent) -> bool) -> bool {
        self.events.iter().any(predicate)
    }
}
