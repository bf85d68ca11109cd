//! Engine controller.
//!
//! The controller owns an immutable [`EngineState`] snapshot. Each command
//! is applied to a copy that replaces the snapshot only when the command
//! succeeds, so a rejected command never leaves partial changes behind.
//! Previous snapshots double as undo history.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use cephkit_core::constants::{HIT_RADIUS_PX, MAGNIFIER_SIZE_PX, MAGNIFIER_ZOOM};
use cephkit_core::{AcquisitionError, Error, InputError, Result, SnapshotError, ViewportPolicy};
use uuid::Uuid;

use crate::annotation::Annotation;
use crate::calibration::{CalibrationMode, CalibrationState, CaptureOutcome};
use crate::catalogue::{Catalogue, ProjectionConfig};
use crate::commands::{CommandOutcome, EngineCommand};
use crate::event::EngineEvent;
use crate::measurement::{evaluate_all, Measurement};
use crate::model::{CanvasPoint, Size};
use crate::point_store::PointStore;
use crate::raster::{ImageSource, RasterInfo, RasterPayload, RasterRequest};
use crate::report::AnalysisReport;
use crate::serialization::SessionSnapshot;
use crate::tools::{Key, PointerButton, ToolMode};
use crate::viewport::CoordinateMapper;

/// Maximum number of undo steps kept
pub const MAX_HISTORY: usize = 50;

/// Engine-wide settings fixed at construction
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub viewport_policy: ViewportPolicy,
    /// Hit-test radius in canvas pixels
    pub hit_radius_px: f64,
    pub magnifier_zoom: f64,
    pub magnifier_size_px: u32,
    pub history_limit: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            viewport_policy: ViewportPolicy::default(),
            hit_radius_px: HIT_RADIUS_PX,
            magnifier_zoom: MAGNIFIER_ZOOM,
            magnifier_size_px: MAGNIFIER_SIZE_PX,
            history_limit: MAX_HISTORY,
        }
    }
}

impl EngineOptions {
    pub fn with_policy(mut self, policy: ViewportPolicy) -> Self {
        self.viewport_policy = policy;
        self
    }
}

/// Overlays the user switched off. Everything is visible by default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayVisibility {
    hidden_lines: BTreeSet<String>,
    hidden_angles: BTreeSet<String>,
}

impl OverlayVisibility {
    pub fn line_visible(&self, key: &str) -> bool {
        !self.hidden_lines.contains(key)
    }

    pub fn angle_visible(&self, key: &str) -> bool {
        !self.hidden_angles.contains(key)
    }

    /// Flips a key and returns its new visibility.
    fn toggle(set: &mut BTreeSet<String>, key: &str) -> bool {
        if set.remove(key) {
            true
        } else {
            set.insert(key.to_string());
            false
        }
    }
}

/// Everything the engine keeps for one projection
#[derive(Debug, Clone)]
pub struct ProjectionSession {
    pub points: PointStore,
    pub calibration: CalibrationState,
    pub annotations: Vec<Annotation>,
    pub raster: Option<RasterInfo>,
    pub overlays: OverlayVisibility,
}

impl ProjectionSession {
    pub fn new(calibration: CalibrationMode) -> Self {
        Self {
            points: PointStore::new(),
            calibration: CalibrationState::new(calibration),
            annotations: Vec::new(),
            raster: None,
            overlays: OverlayVisibility::default(),
        }
    }

    /// Same landmarks, calibration and annotations. Selection, raster and
    /// overlays are view state and not compared.
    pub fn same_document(&self, other: &ProjectionSession) -> bool {
        self.points.to_ordered() == other.points.to_ordered()
            && self.calibration == other.calibration
            && self.annotations == other.annotations
    }

    fn restore_document(&mut self, from: &ProjectionSession) {
        self.points = from.points.clone();
        self.points.end_drag();
        self.calibration = from.calibration.clone();
        self.annotations = from.annotations.clone();
    }
}

/// Magnifier inset state
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Magnifier {
    pub enabled: bool,
    /// Canvas position the inset is centred on
    pub center: Option<CanvasPoint>,
}

/// Immutable engine snapshot
#[derive(Debug, Clone)]
pub struct EngineState {
    projection: String,
    active: ProjectionSession,
    parked: BTreeMap<String, ProjectionSession>,
    tool: ToolMode,
    mapper: CoordinateMapper,
    magnifier: Magnifier,
}

impl EngineState {
    fn new(config: &ProjectionConfig, policy: ViewportPolicy) -> Self {
        Self {
            projection: config.key.clone(),
            active: ProjectionSession::new(config.calibration),
            parked: BTreeMap::new(),
            tool: ToolMode::Select,
            mapper: CoordinateMapper::new(policy),
            magnifier: Magnifier::default(),
        }
    }

    /// Active projection key.
    pub fn projection(&self) -> &str {
        &self.projection
    }

    pub fn session(&self) -> &ProjectionSession {
        &self.active
    }

    /// Session of any projection visited so far.
    pub fn session_for(&self, projection: &str) -> Option<&ProjectionSession> {
        if projection == self.projection {
            Some(&self.active)
        } else {
            self.parked.get(projection)
        }
    }

    fn session_mut(&mut self, projection: &str, config: &ProjectionConfig) -> &mut ProjectionSession {
        if projection == self.projection {
            &mut self.active
        } else {
            self.parked
                .entry(projection.to_string())
                .or_insert_with(|| ProjectionSession::new(config.calibration))
        }
    }

    pub fn points(&self) -> &PointStore {
        &self.active.points
    }

    pub fn calibration(&self) -> &CalibrationState {
        &self.active.calibration
    }

    pub fn raster(&self) -> Option<&RasterInfo> {
        self.active.raster.as_ref()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.active.annotations
    }

    pub fn overlays(&self) -> &OverlayVisibility {
        &self.active.overlays
    }

    pub fn tool(&self) -> ToolMode {
        self.tool
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn magnifier(&self) -> Magnifier {
        self.magnifier
    }

    /// Whether the document of `projection` differs between two snapshots.
    fn document_changed(&self, after: &EngineState) -> bool {
        match after.session_for(&self.projection) {
            Some(session) => !self.active.same_document(session),
            None => true,
        }
    }
}

/// Owns the engine state and applies commands to it.
pub struct Controller {
    catalogue: Arc<Catalogue>,
    options: EngineOptions,
    state: Arc<EngineState>,
    undo_stack: Vec<Arc<EngineState>>,
    redo_stack: Vec<Arc<EngineState>>,
    /// State before the drag in progress began
    drag_origin: Option<Arc<EngineState>>,
    generation: u64,
    pending: Option<RasterRequest>,
}

impl Controller {
    pub fn new(catalogue: Arc<Catalogue>, projection: &str, options: EngineOptions) -> Result<Self> {
        let config = catalogue.require(projection)?;
        let state = EngineState::new(config, options.viewport_policy);
        tracing::debug!("Engine created on {} ({})", projection, options.viewport_policy);
        Ok(Self {
            catalogue,
            options,
            state: Arc::new(state),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            drag_origin: None,
            generation: 0,
            pending: None,
        })
    }

    /// Engine over the built-in catalogue with default options.
    pub fn builtin(projection: &str) -> Result<Self> {
        Self::new(Arc::new(Catalogue::builtin()), projection, EngineOptions::default())
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Shared handle to the current snapshot.
    pub fn snapshot_state(&self) -> Arc<EngineState> {
        Arc::clone(&self.state)
    }

    /// Configuration of the active projection.
    pub fn active_config(&self) -> Result<&ProjectionConfig> {
        Ok(self.catalogue.require(&self.state.projection)?)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Applies a command.
    ///
    /// On error the committed state is unchanged.
    pub fn apply(&mut self, command: EngineCommand) -> Result<CommandOutcome> {
        if command.is_motion() {
            tracing::trace!("Applying {}", command.name());
        } else {
            tracing::debug!("Applying {}", command.name());
        }
        match command {
            EngineCommand::Undo => return self.undo(),
            EngineCommand::Redo => return self.redo(),
            _ => {}
        }

        let mut next = (*self.state).clone();
        let mut tx = Transition::new(&mut next, &self.catalogue, &self.options);
        let redraw = tx.run(command)?;
        let events = tx.events;
        self.commit(next);
        Ok(CommandOutcome { events, redraw })
    }

    fn commit(&mut self, next: EngineState) {
        let prev = std::mem::replace(&mut self.state, Arc::new(next));
        if self.state.active.points.is_dragging() {
            if self.drag_origin.is_none() {
                self.drag_origin = Some(prev);
            }
            return;
        }
        let origin = self.drag_origin.take().unwrap_or(prev);
        if origin.document_changed(&self.state) {
            self.push_undo(origin);
        }
    }

    fn push_undo(&mut self, state: Arc<EngineState>) {
        self.undo_stack.push(state);
        if self.undo_stack.len() > self.options.history_limit {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    pub fn undo(&mut self) -> Result<CommandOutcome> {
        let target = self.undo_stack.pop().ok_or(InputError::NoUndo)?;
        let current = Arc::clone(&self.state);
        let outcome = self.rewind_to(&target)?;
        self.redo_stack.push(current);
        tracing::debug!("Undo ({} left)", self.undo_stack.len());
        Ok(outcome)
    }

    pub fn redo(&mut self) -> Result<CommandOutcome> {
        let target = self.redo_stack.pop().ok_or(InputError::NoRedo)?;
        let current = Arc::clone(&self.state);
        let outcome = self.rewind_to(&target)?;
        self.undo_stack.push(current);
        tracing::debug!("Redo ({} left)", self.redo_stack.len());
        Ok(outcome)
    }

    /// Restores every projection's document from `target`, keeping the
    /// current raster, view and active projection.
    fn rewind_to(&mut self, target: &EngineState) -> Result<CommandOutcome> {
        let mut next = (*self.state).clone();
        let keys: Vec<String> = std::iter::once(next.projection.clone())
            .chain(next.parked.keys().cloned())
            .collect();
        for key in keys {
            let config = self.catalogue.require(&key)?;
            let session = next.session_mut(&key, config);
            match target.session_for(&key) {
                Some(saved) => session.restore_document(saved),
                None => session.restore_document(&ProjectionSession::new(config.calibration)),
            }
        }
        self.drag_origin = None;

        let mut tx = Transition::new(&mut next, &self.catalogue, &self.options);
        tx.enforce_tool_gate();
        let next_landmark = tx.next_landmark();
        tx.events.push(EngineEvent::NextLandmark(next_landmark));
        let events = tx.events;
        self.state = Arc::new(next);
        Ok(CommandOutcome::redraw(events))
    }

    /// Starts a raster acquisition for `projection`.
    ///
    /// Any earlier request still in flight is superseded.
    pub fn request_raster(&mut self, projection: &str, source: ImageSource) -> Result<RasterRequest> {
        self.catalogue.require(projection)?;
        self.generation += 1;
        let request = RasterRequest {
            generation: self.generation,
            projection: projection.to_string(),
            source,
        };
        tracing::info!(
            "Requesting {} image for {} (#{})",
            request.source.kind(),
            projection,
            request.generation
        );
        self.pending = Some(request.clone());
        Ok(request)
    }

    /// Latest generation handed out by [`Controller::request_raster`].
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Delivers the result of an acquisition.
    ///
    /// Deliveries for superseded generations are discarded without touching
    /// state. A failed acquisition leaves the projection without a raster
    /// and is returned as [`Error::Acquisition`].
    pub fn on_raster_ready(
        &mut self,
        generation: u64,
        result: std::result::Result<RasterPayload, AcquisitionError>,
    ) -> Result<CommandOutcome> {
        let Some(request) = self.pending.take_if(|p| p.generation == generation) else {
            tracing::debug!("Discarding stale image #{} (latest #{})", generation, self.generation);
            return Ok(CommandOutcome {
                events: vec![EngineEvent::RasterDiscarded { generation }],
                redraw: false,
            });
        };
        let projection = request.projection;
        let config = self.catalogue.require(&projection)?;
        let is_active = projection == self.state.projection;
        let mut next = (*self.state).clone();

        match result.and_then(RasterInfo::from_payload) {
            Ok(info) => {
                let (width, height) = (info.width, info.height);
                if is_active {
                    next.mapper.set_image_size(info.size())?;
                    next.magnifier = Magnifier::default();
                }
                next.session_mut(&projection, config).raster = Some(info);
                tracing::info!("Image ready for {}: {}x{}", projection, width, height);
                self.state = Arc::new(next);
                Ok(CommandOutcome::redraw(vec![EngineEvent::RasterReady { width, height }]))
            }
            Err(err) => {
                tracing::warn!("Image acquisition failed for {}: {}", projection, err);
                next.session_mut(&projection, config).raster = None;
                if is_active {
                    next.mapper.clear_image();
                    let mut tx = Transition::new(&mut next, &self.catalogue, &self.options);
                    tx.enforce_tool_gate();
                }
                self.state = Arc::new(next);
                Err(Error::Acquisition(err))
            }
        }
    }

    /// Measurements of the active projection that can be computed now.
    pub fn measurements(&self) -> Vec<Measurement> {
        match self.catalogue.get(&self.state.projection) {
            Some(config) => evaluate_all(config, &self.state.active.points, &self.state.active.calibration),
            None => Vec::new(),
        }
    }

    /// Landmark the place-point tool will assign next.
    pub fn next_to_place(&self) -> Option<String> {
        self.catalogue
            .get(&self.state.projection)
            .and_then(|config| config.next_to_place(&self.state.active.points))
            .map(|l| l.id.clone())
    }

    pub fn report(&self) -> Result<AnalysisReport> {
        let config = self.active_config()?;
        Ok(AnalysisReport::new(config, self.measurements()))
    }

    /// Serializable snapshot of the active projection.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.state.projection, &self.state.active, self.measurements())
    }

    /// Rehydrates a snapshot into its projection and makes it active.
    ///
    /// The stored measurements are ignored and recomputed. Undo history is
    /// cleared.
    pub fn restore(&mut self, snapshot: &SessionSnapshot) -> Result<CommandOutcome> {
        snapshot.check_version()?;
        let config = self.catalogue.require(&snapshot.projection_type)?;
        let points = PointStore::from_ordered(&snapshot.points).map_err(|id| SnapshotError::Invalid {
            reason: format!("duplicate landmark '{}'", id),
        })?;
        if let Some((id, _)) = points.iter().find(|(id, _)| config.landmark(id).is_none()) {
            return Err(InputError::UnknownLandmark {
                projection: config.key.clone(),
                landmark: id.to_string(),
            }
            .into());
        }
        if let Some((id, p)) = points.iter().find(|(_, p)| !p.is_finite()) {
            return Err(SnapshotError::Invalid {
                reason: format!("landmark '{}' has non-finite position {}", id, p),
            }
            .into());
        }
        let calibration = snapshot.calibration.to_state()?;

        let mut next = (*self.state).clone();
        let mut tx = Transition::new(&mut next, &self.catalogue, &self.options);
        tx.set_projection(&snapshot.projection_type)?;
        tx.state.active.points = points;
        tx.state.active.calibration = calibration;
        tx.state.active.annotations = snapshot.annotations.clone();
        tx.enforce_tool_gate();
        tx.events.push(EngineEvent::Restored);
        let next_landmark = tx.next_landmark();
        tx.events.push(EngineEvent::NextLandmark(next_landmark));
        let events = tx.events;

        tracing::info!(
            "Restored {} landmarks on {} (calibrated: {})",
            snapshot.points.len(),
            snapshot.projection_type,
            next.active.calibration.is_calibrated()
        );
        self.state = Arc::new(next);
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.drag_origin = None;
        Ok(CommandOutcome::redraw(events))
    }
}

/// One command being applied to a working copy of the state.
struct Transition<'a> {
    state: &'a mut EngineState,
    catalogue: &'a Catalogue,
    options: &'a EngineOptions,
    events: Vec<EngineEvent>,
}

impl<'a> Transition<'a> {
    fn new(state: &'a mut EngineState, catalogue: &'a Catalogue, options: &'a EngineOptions) -> Self {
        Self {
            state,
            catalogue,
            options,
            events: Vec::new(),
        }
    }

    /// Runs a command and reports whether a redraw is needed.
    fn run(&mut self, command: EngineCommand) -> Result<bool> {
        match command {
            EngineCommand::SelectTool(tool) => self.select_tool(tool),
            EngineCommand::SetProjection(key) => self.set_projection(&key),
            EngineCommand::ResizeCanvas { width, height } => {
                self.state.mapper.set_canvas_size(Size::new(width, height))?;
                self.events.push(EngineEvent::ViewChanged);
                Ok(true)
            }
            EngineCommand::PointerDown { at, button } => match button {
                PointerButton::Primary => self.primary_click(at),
                PointerButton::Secondary => self.delete_last(),
                PointerButton::Middle => Ok(self.toggle_magnifier(at)),
            },
            EngineCommand::PointerMove { at } => Ok(self.pointer_move(at)),
            EngineCommand::PointerUp { .. } => {
                self.state.active.points.end_drag();
                Ok(false)
            }
            EngineCommand::PointerLeave => Ok(self.pointer_leave()),
            EngineCommand::KeyPress(Key::Delete | Key::Backspace) => self.delete_selected(),
            EngineCommand::KeyPress(Key::Escape) => Ok(self.clear_selection()),
            EngineCommand::PlacePoint { at } => self.place_point(at),
            EngineCommand::Calibrate { at } => self.calibrate(at),
            EngineCommand::SetCalibrationMode(mode) => {
                self.state.active.calibration.set_mode(mode)?;
                Ok(self.calibration_reset())
            }
            EngineCommand::SetObjectSize(size_mm) => {
                self.state.active.calibration.set_object_size(size_mm)?;
                Ok(self.calibration_reset())
            }
            EngineCommand::ResetCalibration => {
                self.state.active.calibration.reset();
                Ok(self.calibration_reset())
            }
            EngineCommand::CalibrateFromPixelSpacing => self.calibrate_from_spacing(),
            EngineCommand::SelectPoint(Some(id)) => self.select_point(id),
            EngineCommand::SelectPoint(None) => Ok(self.clear_selection()),
            EngineCommand::DeleteSelected => self.delete_selected(),
            EngineCommand::DeleteLast => self.delete_last(),
            EngineCommand::ClearPoints => Ok(self.clear_points()),
            EngineCommand::AddAnnotation { at, text } => self.add_annotation(at, text),
            EngineCommand::RemoveAnnotation(id) => Ok(self.remove_annotation(id)),
            EngineCommand::ToggleReferenceLine(key) => self.toggle_line(key),
            EngineCommand::ToggleAngleOverlay(key) => self.toggle_angle(key),
            EngineCommand::ToggleMagnifier { at } => Ok(self.toggle_magnifier(at)),
            EngineCommand::ZoomIn => Ok(self.view_change(CoordinateMapper::zoom_in)),
            EngineCommand::ZoomOut => Ok(self.view_change(CoordinateMapper::zoom_out)),
            EngineCommand::PanBy { dx, dy } => Ok(self.view_change(|m| m.pan_by(dx, dy))),
            EngineCommand::ResetView => Ok(self.view_change(CoordinateMapper::reset_view)),
            EngineCommand::Undo | EngineCommand::Redo => Ok(false),
        }
    }

    fn config(&self) -> std::result::Result<&'a ProjectionConfig, InputError> {
        self.catalogue.require(&self.state.projection)
    }

    fn next_landmark(&self) -> Option<String> {
        self.config()
            .ok()
            .and_then(|config| config.next_to_place(&self.state.active.points))
            .map(|l| l.id.clone())
    }

    fn require_raster(&self) -> std::result::Result<&RasterInfo, InputError> {
        self.state.active.raster.as_ref().ok_or(InputError::RasterNotReady)
    }

    fn set_tool(&mut self, tool: ToolMode) {
        self.state.tool = tool;
        self.state.active.points.end_drag();
        tracing::info!("Tool changed to {}", tool);
        self.events.push(EngineEvent::ToolChanged(tool));
        if tool == ToolMode::PlacePoint {
            let next = self.next_landmark();
            self.events.push(EngineEvent::NextLandmark(next));
        }
    }

    fn select_tool(&mut self, tool: ToolMode) -> Result<bool> {
        if tool.requires_raster() {
            self.require_raster()?;
        }
        if tool.requires_calibration() && !self.state.active.calibration.is_calibrated() {
            return Err(InputError::NotCalibrated.into());
        }
        if tool == self.state.tool {
            return Ok(false);
        }
        self.set_tool(tool);
        Ok(true)
    }

    /// Falls back to a tool the current state still allows.
    fn enforce_tool_gate(&mut self) {
        let tool = self.state.tool;
        let has_raster = self.state.active.raster.is_some();
        if tool.requires_raster() && !has_raster {
            self.set_tool(ToolMode::Select);
        } else if tool.requires_calibration() && !self.state.active.calibration.is_calibrated() {
            self.set_tool(ToolMode::Calibrate);
        }
    }

    fn set_projection(&mut self, key: &str) -> Result<bool> {
        let config = self.catalogue.require(key)?;
        if key == self.state.projection {
            return Ok(false);
        }
        self.state.active.points.end_drag();
        let incoming = self
            .state
            .parked
            .remove(key)
            .unwrap_or_else(|| ProjectionSession::new(config.calibration));
        let outgoing = std::mem::replace(&mut self.state.active, incoming);
        let previous = std::mem::replace(&mut self.state.projection, key.to_string());
        self.state.parked.insert(previous, outgoing);

        match self.state.active.raster.as_ref().map(RasterInfo::size) {
            Some(size) => self.state.mapper.set_image_size(size)?,
            None => self.state.mapper.clear_image(),
        }
        self.state.magnifier = Magnifier::default();
        tracing::info!("Switched projection to {}", key);
        self.events.push(EngineEvent::ProjectionChanged(key.to_string()));
        self.enforce_tool_gate();
        Ok(true)
    }

    fn primary_click(&mut self, at: CanvasPoint) -> Result<bool> {
        match self.state.tool {
            ToolMode::Select => Ok(self.select_at(at)),
            ToolMode::Calibrate => self.calibrate(at),
            ToolMode::PlacePoint => self.place_point(at),
            ToolMode::Annotate => self.add_annotation(at, None),
        }
    }

    fn select_at(&mut self, at: CanvasPoint) -> bool {
        let state = &mut *self.state;
        let hit = state.active.points.hit_test(&at, &state.mapper, self.options.hit_radius_px);
        match hit {
            Some(id) => {
                state.active.points.begin_drag(&id, &at, &state.mapper);
                self.events.push(EngineEvent::SelectionChanged(Some(id)));
                true
            }
            None => self.clear_selection(),
        }
    }

    fn select_point(&mut self, id: String) -> Result<bool> {
        if !self.state.active.points.select(&id) {
            return Err(InputError::UnknownLandmark {
                projection: self.state.projection.clone(),
                landmark: id,
            }
            .into());
        }
        self.events.push(EngineEvent::SelectionChanged(Some(id)));
        Ok(true)
    }

    fn clear_selection(&mut self) -> bool {
        let had_selection = self.state.active.points.selected().is_some();
        self.state.active.points.clear_selection();
        if had_selection {
            self.events.push(EngineEvent::SelectionChanged(None));
        }
        had_selection
    }

    fn pointer_move(&mut self, at: CanvasPoint) -> bool {
        let mut redraw = false;
        if self.state.magnifier.enabled {
            self.state.magnifier.center = Some(at);
            redraw = true;
        }
        let state = &mut *self.state;
        if let Some((id, p)) = state.active.points.drag_to(&at, &state.mapper) {
            self.events.push(EngineEvent::PointMoved { id, at: p });
            self.refresh_derived();
            redraw = true;
        }
        redraw
    }

    fn pointer_leave(&mut self) -> bool {
        self.state.active.points.end_drag();
        if !self.state.magnifier.enabled {
            return false;
        }
        self.state.magnifier = Magnifier::default();
        self.events.push(EngineEvent::MagnifierToggled(false));
        true
    }

    fn toggle_magnifier(&mut self, at: CanvasPoint) -> bool {
        let enabled = !self.state.magnifier.enabled;
        self.state.magnifier = Magnifier {
            enabled,
            center: enabled.then_some(at),
        };
        self.events.push(EngineEvent::MagnifierToggled(enabled));
        true
    }

    fn refresh_derived(&mut self) {
        let Ok(config) = self.config() else {
            return;
        };
        let points = &mut self.state.active.points;
        for id in config.refresh_derived(points) {
            if let Some(at) = points.get(&id) {
                tracing::debug!("Derived {} at {}", id, at);
                self.events.push(EngineEvent::PointDerived { id, at });
            }
        }
    }

    fn place_point(&mut self, at: CanvasPoint) -> Result<bool> {
        self.require_raster()?;
        if !self.state.active.calibration.is_calibrated() {
            return Err(InputError::NotCalibrated.into());
        }
        if !self.state.mapper.contains_canvas_point(&at) {
            tracing::debug!("Ignoring placement outside the image at {}", at);
            return Ok(false);
        }
        let config = self.config()?;
        let id = config
            .next_to_place(&self.state.active.points)
            .map(|l| l.id.clone())
            .ok_or_else(|| InputError::NothingToPlace {
                projection: config.key.clone(),
            })?;
        let p = self.state.mapper.to_image_space(&at);
        self.state.active.points.insert(&id, p);
        tracing::debug!("Placed {} at {}", id, p);
        self.events.push(EngineEvent::PointPlaced { id, at: p });
        self.refresh_derived();
        let next = self.next_landmark();
        self.events.push(EngineEvent::NextLandmark(next));
        Ok(true)
    }

    fn calibrate(&mut self, at: CanvasPoint) -> Result<bool> {
        self.require_raster()?;
        if !self.state.mapper.contains_canvas_point(&at) {
            tracing::debug!("Ignoring calibration click outside the image at {}", at);
            return Ok(false);
        }
        let p = self.state.mapper.to_image_space(&at);
        match self.state.active.calibration.capture(p)? {
            CaptureOutcome::FirstPoint => {
                self.events.push(EngineEvent::CalibrationStarted { at: p });
                Ok(true)
            }
            CaptureOutcome::Completed { scale } => {
                tracing::info!("Calibration complete: {:.4} px/mm", scale);
                self.events.push(EngineEvent::CalibrationCompleted { scale });
                self.set_tool(ToolMode::PlacePoint);
                Ok(true)
            }
            CaptureOutcome::AlreadyComplete => Ok(false),
        }
    }

    fn calibrate_from_spacing(&mut self) -> Result<bool> {
        let spacing = self.require_raster()?.pixel_spacing.ok_or(InputError::NotCalibrated)?;
        let scale = self.state.active.calibration.calibrate_from_spacing(spacing)?;
        tracing::info!("Calibrated from pixel spacing: {:.4} px/mm", scale);
        self.events.push(EngineEvent::CalibrationCompleted { scale });
        self.set_tool(ToolMode::PlacePoint);
        Ok(true)
    }

    fn calibration_reset(&mut self) -> bool {
        tracing::info!("Calibration reset ({})", self.state.active.calibration.mode());
        self.events.push(EngineEvent::CalibrationReset);
        self.enforce_tool_gate();
        true
    }

    fn remove_landmark(&mut self, id: &str) -> Result<bool> {
        let config = self.config()?;
        let removed = config.remove_landmark(&mut self.state.active.points, id);
        if removed.is_empty() {
            tracing::debug!("{} follows its dependencies and is not removed", id);
            return Ok(false);
        }
        for id in removed {
            self.events.push(EngineEvent::PointRemoved { id });
        }
        let next = self.next_landmark();
        self.events.push(EngineEvent::NextLandmark(next));
        Ok(true)
    }

    fn delete_selected(&mut self) -> Result<bool> {
        let Some(id) = self.state.active.points.selected().map(str::to_string) else {
            return Ok(false);
        };
        let removed = self.remove_landmark(&id)?;
        if removed {
            self.events.push(EngineEvent::SelectionChanged(None));
        }
        Ok(removed)
    }

    fn delete_last(&mut self) -> Result<bool> {
        let config = self.config()?;
        match config.last_removable(&self.state.active.points) {
            Some(id) => self.remove_landmark(&id),
            None => Ok(false),
        }
    }

    fn clear_points(&mut self) -> bool {
        let points = &mut self.state.active.points;
        if points.is_empty() {
            return false;
        }
        for id in points.history() {
            self.events.push(EngineEvent::PointRemoved { id: id.clone() });
        }
        points.clear();
        let next = self.next_landmark();
        self.events.push(EngineEvent::NextLandmark(next));
        true
    }

    fn add_annotation(&mut self, at: CanvasPoint, text: Option<String>) -> Result<bool> {
        self.require_raster()?;
        if !self.state.mapper.contains_canvas_point(&at) {
            return Ok(false);
        }
        let p = self.state.mapper.to_image_space(&at);
        let annotation = Annotation::new(&self.state.projection, p, text);
        self.events.push(EngineEvent::AnnotationAdded { id: annotation.id });
        self.state.active.annotations.push(annotation);
        Ok(true)
    }

    fn remove_annotation(&mut self, id: Uuid) -> bool {
        let annotations = &mut self.state.active.annotations;
        let Some(index) = annotations.iter().position(|a| a.id == id) else {
            return false;
        };
        annotations.remove(index);
        self.events.push(EngineEvent::AnnotationRemoved { id });
        true
    }

    fn toggle_line(&mut self, key: String) -> Result<bool> {
        if self.config()?.reference_line(&key).is_none() {
            return Err(InputError::UnknownOverlay { key }.into());
        }
        let visible = OverlayVisibility::toggle(&mut self.state.active.overlays.hidden_lines, &key);
        self.events.push(EngineEvent::OverlayToggled { key, visible });
        Ok(true)
    }

    fn toggle_angle(&mut self, key: String) -> Result<bool> {
        if self.config()?.angle_overlay(&key).is_none() {
            return Err(InputError::UnknownOverlay { key }.into());
        }
        let visible = OverlayVisibility::toggle(&mut self.state.active.overlays.hidden_angles, &key);
        self.events.push(EngineEvent::OverlayToggled { key, visible });
        Ok(true)
    }

    fn view_change(&mut self, change: impl FnOnce(&mut CoordinateMapper) -> bool) -> bool {
        let changed = change(&mut self.state.mapper);
        if changed {
            self.events.push(EngineEvent::ViewChanged);
        }
        changed
    }
}
