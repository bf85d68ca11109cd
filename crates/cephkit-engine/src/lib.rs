//! # cephkit Engine
//!
//! Landmark placement, calibration and measurement for medical images.
//! One engine serves every imaging module; what differs between them lives
//! in a [`ProjectionConfig`].
//!
//! ## Core Components
//!
//! - **Viewport**: letterbox fit plus an optional user zoom/pan layer
//! - **Calibration**: px/mm scale from two reference points or pixel spacing
//! - **Point store**: named landmarks in image space with an insertion history
//! - **Catalogue**: declarative landmark lists, formulas and norm classifiers
//! - **Controller**: tool state machine over immutable state snapshots
//! - **Renderer**: tiny-skia scene and magnifier rendering
//!
//! ## Architecture
//!
//! ```text
//! Host events ──> Controller ──> EngineState (Arc snapshot)
//!                     │              ├── PointStore
//!                     │              ├── CalibrationState
//!                     │              └── CoordinateMapper
//!                     ├── Catalogue (ProjectionConfig)
//!                     └── measurements / report / snapshot
//!
//! Renderer <── Scene (EngineState + ProjectionConfig)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cephkit_engine::{Controller, EngineCommand, CanvasPoint, PointerButton};
//!
//! let mut engine = Controller::builtin("ceph.lateral")?;
//! let request = engine.request_raster("ceph.lateral", source)?;
//! engine.on_raster_ready(request.generation, decoder.resolve(&request.source))?;
//! engine.apply(EngineCommand::SelectTool(ToolMode::Calibrate))?;
//! engine.apply(EngineCommand::PointerDown { at: CanvasPoint::new(10.0, 10.0), button: PointerButton::Primary })?;
//! ```

pub mod annotation;
pub mod calibration;
pub mod catalogue;
pub mod commands;
pub mod controller;
pub mod event;
pub mod font;
pub mod geometry;
pub mod measurement;
pub mod model;
pub mod point_store;
pub mod raster;
pub mod renderer;
pub mod report;
pub mod serialization;
pub mod tools;
pub mod viewport;

pub use annotation::Annotation;
pub use calibration::{CalibrationMode, CalibrationState, FixedDistance, PixelSpacing, ReferenceObject};
pub use catalogue::{Catalogue, Classifier, Deviation, Formula, MeasurementDef, Module, ProjectionConfig};
pub use commands::{CommandOutcome, EngineCommand};
pub use controller::{Controller, EngineOptions, EngineState, ProjectionSession};
pub use event::EngineEvent;
pub use measurement::Measurement;
pub use model::{CanvasPoint, Point, Size};
pub use point_store::{LandmarkPoint, PointStore};
pub use raster::{ImageDecoder, ImageRaster, ImageSource, RasterPayload, RasterRequest, RasterResolver};
pub use renderer::{RenderStyle, Renderer, Scene};
pub use report::AnalysisReport;
pub use serialization::SessionSnapshot;
pub use tools::{Key, PointerButton, ToolMode};
pub use viewport::CoordinateMapper;

pub use cephkit_core::{Error, InputError, MeasurementUnit, Result, ViewportPolicy};
