//! Error handling for cephkit
//!
//! Provides the error types shared by every layer of the engine:
//! - Input errors (recoverable, user-facing rejections of a command)
//! - Acquisition errors (failures of the raster-decoding collaborator)
//! - Snapshot errors (malformed or incompatible persisted sessions)
//!
//! Degenerate geometry is deliberately absent here: geometry functions return
//! neutral values (`0.0` or `None`) instead of failing.

use thiserror::Error;

/// Input error type
///
/// Raised when a command cannot be applied in the current state. The command
/// is aborted and the committed engine state is left untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// No raster has been delivered for the active projection
    #[error("No image is loaded for the active projection")]
    RasterNotReady,

    /// Landmark placement attempted before calibration completed
    #[error("Calibrate the image before placing landmarks")]
    NotCalibrated,

    /// Reference object size must be strictly positive
    #[error("Calibration object size must be positive, got {size_mm}")]
    NonPositiveObjectSize {
        /// The rejected size in millimetres.
        size_mm: f64,
    },

    /// Second calibration point lies on top of the first one
    #[error("Calibration points must not coincide")]
    CoincidentCalibrationPoints,

    /// Raster reference is missing or has unusable dimensions
    #[error("Invalid image: {reason}")]
    InvalidRaster {
        /// Why the raster was rejected.
        reason: String,
    },

    /// Projection key not present in the catalogue
    #[error("Unknown projection type: {projection}")]
    UnknownProjection {
        /// The requested projection key.
        projection: String,
    },

    /// Landmark id not declared by the active projection
    #[error("Unknown landmark '{landmark}' for projection {projection}")]
    UnknownLandmark {
        /// The active projection key.
        projection: String,
        /// The unknown landmark id.
        landmark: String,
    },

    /// Every landmark of the projection has already been placed
    #[error("All landmarks for {projection} are already placed")]
    NothingToPlace {
        /// The active projection key.
        projection: String,
    },

    /// Reference line or angle overlay key not declared by the projection
    #[error("Unknown overlay '{key}'")]
    UnknownOverlay {
        /// The requested overlay key.
        key: String,
    },

    /// Undo stack is empty
    #[error("Nothing to undo")]
    NoUndo,

    /// Redo stack is empty
    #[error("Nothing to redo")]
    NoRedo,
}

/// Acquisition error type
///
/// Failures reported by the raster source collaborator while resolving an
/// image source into a drawable raster.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AcquisitionError {
    /// Payload could not be decoded
    #[error("Failed to decode image: {reason}")]
    Decode {
        /// The decoder message.
        reason: String,
    },

    /// Source variant cannot be resolved by this resolver
    #[error("Unsupported image source: {source_kind}")]
    Unsupported {
        /// The kind of source that was offered.
        source_kind: String,
    },

    /// Decoded raster has no pixels
    #[error("Decoded image is empty ({width}x{height})")]
    EmptyRaster {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
    },

    /// Source could not be read
    #[error("Failed to read image source: {reason}")]
    Io {
        /// The underlying I/O message.
        reason: String,
    },
}

/// Snapshot error type
///
/// Problems found while rehydrating a persisted session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    /// Snapshot was written by an incompatible format version
    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the document.
        found: String,
        /// Version this build writes.
        expected: String,
    },

    /// Snapshot content contradicts itself
    #[error("Invalid snapshot: {reason}")]
    Invalid {
        /// What was wrong.
        reason: String,
    },
}

/// Main error type for cephkit
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Input error
    #[error(transparent)]
    Input(#[from] InputError),

    /// Acquisition error
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    /// Snapshot error
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is an input error
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::Input(_))
    }

    /// Check if this is an acquisition error
    pub fn is_acquisition_error(&self) -> bool {
        matches!(self, Error::Acquisition(_))
    }

    /// Borrow the input error, if any
    pub fn as_input_error(&self) -> Option<&InputError> {
        match self {
            Error::Input(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
