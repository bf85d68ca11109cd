//! Events reported back to the host after a command.
//!
//! The host uses them to update chrome (status bar, landmark list) and
//! always redraws when a command reports a visual change.

use crate::model::Point;
use crate::tools::ToolMode;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Landmark placed by the place-point tool
    PointPlaced { id: String, at: Point },
    /// Derived landmark computed from its dependencies
    PointDerived { id: String, at: Point },
    /// Landmark moved by dragging
    PointMoved { id: String, at: Point },
    PointRemoved { id: String },
    SelectionChanged(Option<String>),
    /// Next landmark the place-point tool will assign
    NextLandmark(Option<String>),
    /// First calibration point captured
    CalibrationStarted { at: Point },
    CalibrationCompleted { scale: f64 },
    CalibrationReset,
    ToolChanged(ToolMode),
    ProjectionChanged(String),
    AnnotationAdded { id: uuid::Uuid },
    AnnotationRemoved { id: uuid::Uuid },
    OverlayToggled { key: String, visible: bool },
    MagnifierToggled(bool),
    ViewChanged,
    RasterReady { width: u32, height: u32 },
    /// Late delivery for a superseded request; nothing changed
    RasterDiscarded { generation: u64 },
    Restored,
}

impl std::fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineEvent::PointPlaced { id, at } => write!(f, "Placed {} at {}", id, at),
            EngineEvent::PointDerived { id, at } => write!(f, "Derived {} at {}", id, at),
            EngineEvent::PointMoved { id, at } => write!(f, "Moved {} to {}", id, at),
            EngineEvent::PointRemoved { id } => write!(f, "Removed {}", id),
            EngineEvent::SelectionChanged(Some(id)) => write!(f, "Selected {}", id),
            EngineEvent::SelectionChanged(None) => write!(f, "Selection cleared"),
            EngineEvent::NextLandmark(Some(id)) => write!(f, "Next landmark: {}", id),
            EngineEvent::NextLandmark(None) => write!(f, "All landmarks placed"),
            EngineEvent::CalibrationStarted { at } => write!(f, "Calibration point at {}", at),
            EngineEvent::CalibrationCompleted { scale } => {
                write!(f, "Calibrated: {:.4} px/mm", scale)
            }
            EngineEvent::CalibrationReset => write!(f, "Calibration reset"),
            EngineEvent::ToolChanged(tool) => write!(f, "Tool: {}", tool),
            EngineEvent::ProjectionChanged(key) => write!(f, "Projection: {}", key),
            EngineEvent::AnnotationAdded { id } => write!(f, "Annotation added: {}", id),
            EngineEvent::AnnotationRemoved { id } => write!(f, "Annotation removed: {}", id),
            EngineEvent::OverlayToggled { key, visible } => {
                write!(f, "Overlay {} {}", key, if *visible { "shown" } else { "hidden" })
            }
            EngineEvent::MagnifierToggled(on) => {
                write!(f, "Magnifier {}", if *on { "on" } else { "off" })
            }
            EngineEvent::ViewChanged => write!(f, "View changed"),
            EngineEvent::RasterReady { width, height } => {
                write!(f, "Image ready: {}x{}", width, height)
            }
            EngineEvent::RasterDiscarded { generation } => {
                write!(f, "Discarded stale image (#{})", generation)
            }
            EngineEvent::Restored => write!(f, "Session restored"),
        }
    }
}
