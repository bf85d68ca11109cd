//! Building an engine session from the command line.
//!
//! Calibration clicks and landmark assignments are replayed through
//! [`EngineCommand`]s, so the binary exercises the same tool gating and
//! history as an interactive host.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context};
use cephkit_engine::raster::Raster;
use cephkit_engine::serialization::load_snapshot;
use cephkit_engine::{
    Catalogue, Controller, EngineCommand, ImageDecoder, ImageSource, PixelSpacing, Point, PointerButton,
    RasterResolver, ToolMode,
};
use cephkit_settings::Config;

use crate::options::{calibration_mode, engine_options};

/// Projection used when neither the command line nor a snapshot names one
pub const DEFAULT_PROJECTION: &str = "ceph.lateral";

/// `ID=X,Y` in image pixels
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkAssignment {
    pub id: String,
    pub at: Point,
}

impl FromStr for LandmarkAssignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, xy) = s
            .split_once('=')
            .ok_or_else(|| format!("expected ID=X,Y, got '{}'", s))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(format!("missing landmark id in '{}'", s));
        }
        Ok(Self {
            id: id.to_string(),
            at: parse_point(xy)?,
        })
    }
}

/// Parses `X,Y`
pub fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = parse_pair(s)?;
    Ok(Point::new(x, y))
}

/// Parses `ROW,COL` millimetres per pixel
pub fn parse_spacing(s: &str) -> Result<PixelSpacing, String> {
    let (row_mm, col_mm) = parse_pair(s)?;
    Ok(PixelSpacing { row_mm, col_mm })
}

fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected two comma-separated numbers, got '{}'", s))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid number '{}'", v.trim()))
    };
    Ok((parse(a)?, parse(b)?))
}

/// Everything needed to open a session
#[derive(Debug, Clone, Default)]
pub struct SessionRequest {
    pub image: PathBuf,
    pub projection: Option<String>,
    pub snapshot: Option<PathBuf>,
    /// Two image-space calibration points
    pub calibration_points: Vec<Point>,
    pub pixel_spacing: Option<PixelSpacing>,
    pub object_size_mm: Option<f64>,
    pub assignments: Vec<LandmarkAssignment>,
}

/// Decodes the image, restores the snapshot and replays the edits.
///
/// The canvas is sized to the image so canvas and image pixels coincide.
pub async fn open_session(request: &SessionRequest, config: &Config) -> anyhow::Result<Controller> {
    let snapshot = match &request.snapshot {
        Some(path) => Some(load_snapshot(path)?),
        None => None,
    };
    if let (Some(projection), Some(snapshot)) = (&request.projection, &snapshot) {
        if projection != &snapshot.projection_type {
            bail!(
                "snapshot is for {}, not {}",
                snapshot.projection_type,
                projection
            );
        }
    }
    let projection = request
        .projection
        .clone()
        .or_else(|| snapshot.as_ref().map(|s| s.projection_type.clone()))
        .unwrap_or_else(|| DEFAULT_PROJECTION.to_string());

    let mut engine = Controller::new(Arc::new(Catalogue::builtin()), &projection, engine_options(config))?;
    let start_mode = calibration_mode(config, &engine.active_config()?.calibration);
    if let Some(mode) = start_mode {
        engine.apply(EngineCommand::SetCalibrationMode(mode))?;
    }

    load_image(&mut engine, &projection, request).await?;

    if let Some(snapshot) = &snapshot {
        engine.restore(snapshot)?;
    }
    if let Some(size_mm) = request.object_size_mm {
        engine.apply(EngineCommand::SetObjectSize(size_mm))?;
    }
    if request.pixel_spacing.is_some() {
        engine.apply(EngineCommand::CalibrateFromPixelSpacing)?;
    }
    if !request.calibration_points.is_empty() {
        calibrate(&mut engine, &request.calibration_points)?;
    }
    for assignment in &request.assignments {
        apply_assignment(&mut engine, assignment)?;
    }

    Ok(engine)
}

async fn load_image(engine: &mut Controller, projection: &str, request: &SessionRequest) -> anyhow::Result<()> {
    let mut decoder = ImageDecoder::new();
    if let Some(spacing) = request.pixel_spacing {
        decoder = decoder.with_pixel_spacing(spacing);
    }

    let raster_request = engine.request_raster(projection, ImageSource::Url(request.image.display().to_string()))?;
    let source = raster_request.source.clone();
    let result = tokio::task::spawn_blocking(move || decoder.resolve(&source))
        .await
        .context("image decoder panicked")?;

    if let Ok(payload) = &result {
        engine.apply(EngineCommand::ResizeCanvas {
            width: payload.raster.width() as f64,
            height: payload.raster.height() as f64,
        })?;
    }
    engine
        .on_raster_ready(raster_request.generation, result)
        .with_context(|| format!("failed to load {}", request.image.display()))?;
    Ok(())
}

fn calibrate(engine: &mut Controller, points: &[Point]) -> anyhow::Result<()> {
    if points.len() != 2 {
        bail!("calibration needs exactly two points, got {}", points.len());
    }
    if engine.state().calibration().is_calibrated() || engine.state().calibration().is_in_progress() {
        engine.apply(EngineCommand::ResetCalibration)?;
    }
    for p in points {
        let at = engine.state().mapper().to_canvas_space(p);
        engine.apply(EngineCommand::Calibrate { at })?;
    }
    if !engine.state().calibration().is_calibrated() {
        bail!("calibration points must lie inside the image");
    }
    Ok(())
}

/// Places `assignment.id` if it is next in line, or drags it there if it
/// is already placed.
pub fn apply_assignment(engine: &mut Controller, assignment: &LandmarkAssignment) -> anyhow::Result<()> {
    let id = assignment.id.as_str();
    let config = engine.active_config()?;
    if config.landmark(id).is_none() {
        bail!("{} has no landmark {}", config.key, id);
    }
    if config.is_managed(id, engine.state().points()) {
        bail!("{} is derived from other landmarks and cannot be set directly", id);
    }
    let target = engine.state().mapper().to_canvas_space(&assignment.at);

    if let Some(current) = engine.state().points().get(id) {
        let from = engine.state().mapper().to_canvas_space(&current);
        engine.apply(EngineCommand::SelectTool(ToolMode::Select))?;
        engine.apply(EngineCommand::PointerDown {
            at: from,
            button: PointerButton::Primary,
        })?;
        if engine.state().points().selected() != Some(id) {
            bail!("{} is covered by another landmark and cannot be picked", id);
        }
        engine.apply(EngineCommand::PointerMove { at: target })?;
        engine.apply(EngineCommand::PointerUp { at: target })?;
        tracing::info!("Moved {} to {}", id, assignment.at);
        return Ok(());
    }

    match engine.next_to_place() {
        Some(next) if next == id => {
            engine.apply(EngineCommand::PlacePoint { at: target })?;
            if engine.state().points().get(id).is_none() {
                bail!("{} at {} lies outside the image", id, assignment.at);
            }
            Ok(())
        }
        Some(next) => bail!("{} cannot be placed yet, next landmark is {}", id, next),
        None => bail!("all landmarks are already placed"),
    }
}
