use std::sync::Arc;

use cephkit_core::{Error, InputError, SnapshotError};
use cephkit_engine::catalogue::cephalometry;
use cephkit_engine::commands::EngineCommand;
use cephkit_engine::controller::Controller;
use cephkit_engine::event::EngineEvent;
use cephkit_engine::model::CanvasPoint;
use cephkit_engine::point_store::LandmarkPoint;
use cephkit_engine::raster::{ImageRaster, ImageSource, RasterPayload};
use cephkit_engine::serialization::{load_snapshot, save_snapshot, SessionSnapshot, SNAPSHOT_FORMAT_VERSION};
use cephkit_engine::tools::ToolMode;

/// Lateral session with calibration and the first eight landmarks.
fn lateral_session() -> Controller {
    let mut engine = Controller::builtin(cephalometry::LATERAL).unwrap();
    engine
        .apply(EngineCommand::ResizeCanvas {
            width: 600.0,
            height: 600.0,
        })
        .unwrap();
    let request = engine.request_raster(cephalometry::LATERAL, ImageSource::Handle(9)).unwrap();
    let payload = RasterPayload::new(Arc::new(ImageRaster::blank(600, 600).unwrap()));
    engine.on_raster_ready(request.generation, Ok(payload)).unwrap();
    engine.apply(EngineCommand::SelectTool(ToolMode::Calibrate)).unwrap();
    engine.apply(EngineCommand::Calibrate { at: CanvasPoint::new(20.0, 20.0) }).unwrap();
    engine.apply(EngineCommand::Calibrate { at: CanvasPoint::new(20.0, 97.0) }).unwrap();

    let clicks = [
        (210.3, 180.7),
        (420.9, 150.2),
        (400.1, 300.4),
        (390.6, 420.8),
        (230.5, 290.1),
        (440.2, 285.9),
        (190.4, 420.3),
        (360.8, 520.6),
    ];
    for (x, y) in clicks {
        engine.apply(EngineCommand::PlacePoint { at: CanvasPoint::new(x, y) }).unwrap();
    }
    engine
        .apply(EngineCommand::AddAnnotation {
            at: CanvasPoint::new(300.0, 300.0),
            text: Some("note".into()),
        })
        .unwrap();
    engine
}

#[test]
fn test_snapshot_round_trip_reproduces_measurements() {
    let engine = lateral_session();
    let expected = engine.measurements();
    assert!(!expected.is_empty());

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.version, SNAPSHOT_FORMAT_VERSION);
    assert_eq!(snapshot.metadata.image_width, Some(600));
    assert_eq!(snapshot.points.len(), 8);
    assert_eq!(snapshot.points[0].id, "S");
    let json = snapshot.to_json().unwrap();

    let mut fresh = Controller::builtin(cephalometry::INTRAORAL).unwrap();
    let parsed = SessionSnapshot::from_json(&json).unwrap();
    assert_eq!(parsed, snapshot);
    let outcome = fresh.restore(&parsed).unwrap();
    assert!(outcome.has_event(|e| *e == EngineEvent::Restored));
    assert!(outcome.has_event(|e| *e == EngineEvent::NextLandmark(Some("Pg".into()))));

    assert_eq!(fresh.state().projection(), cephalometry::LATERAL);
    assert_eq!(fresh.measurements(), expected);
    assert_eq!(fresh.state().points().history(), engine.state().points().history());
    assert_eq!(fresh.state().calibration(), engine.state().calibration());
    assert_eq!(fresh.state().annotations(), engine.state().annotations());
    assert!(!fresh.can_undo());
}

#[test]
fn test_restore_replaces_current_document() {
    let mut engine = lateral_session();
    let snapshot = engine.snapshot();
    engine.apply(EngineCommand::ClearPoints).unwrap();
    assert!(engine.state().points().is_empty());
    assert!(engine.can_undo());

    engine.restore(&snapshot).unwrap();
    assert_eq!(engine.state().points().len(), 8);
    assert!(!engine.can_undo());
    // Raster and tool survive a restore on the same projection
    assert!(engine.state().raster().is_some());
    assert_eq!(engine.state().tool(), ToolMode::PlacePoint);
}

#[test]
fn test_restore_rejects_unknown_landmark() {
    let mut engine = lateral_session();
    let mut snapshot = engine.snapshot();
    snapshot.points.push(LandmarkPoint {
        id: "Zz".into(),
        x: 1.0,
        y: 2.0,
    });
    let before = engine.state().points().to_ordered();
    let err = engine.restore(&snapshot).unwrap_err();
    assert!(matches!(err.as_input_error(), Some(InputError::UnknownLandmark { .. })));
    assert_eq!(engine.state().points().to_ordered(), before);
}

#[test]
fn test_restore_rejects_duplicates_and_versions() {
    let mut engine = lateral_session();
    let mut snapshot = engine.snapshot();
    let first = snapshot.points[0].clone();
    snapshot.points.push(first);
    let err = engine.restore(&snapshot).unwrap_err();
    assert!(matches!(err, Error::Snapshot(SnapshotError::Invalid { .. })));

    let mut snapshot = engine.snapshot();
    snapshot.version = 0;
    let err = engine.restore(&snapshot).unwrap_err();
    assert!(matches!(err, Error::Snapshot(SnapshotError::UnsupportedVersion { .. })));

    let mut snapshot = engine.snapshot();
    snapshot.projection_type = "ceph.unknown".into();
    let err = engine.restore(&snapshot).unwrap_err();
    assert!(matches!(err.as_input_error(), Some(InputError::UnknownProjection { .. })));
}

#[test]
fn test_older_documents_without_optional_fields() {
    let json = r#"{
        "version": 1,
        "metadata": {"created_at": "2024-05-01T10:00:00Z", "application": "cephkit 0.1.0"},
        "projection_type": "ceph.intraoral",
        "points": [
            {"id": "midline_upper", "x": 10.0, "y": 10.0},
            {"id": "midline_lower", "x": 10.0, "y": 13.0}
        ],
        "calibration": {
            "mode": {"kind": "reference_object", "object": "crown", "size_mm": 8.0},
            "points": [{"x": 0.0, "y": 0.0}, {"x": 16.0, "y": 0.0}],
            "scale": 2.0
        }
    }"#;
    let snapshot = SessionSnapshot::from_json(json).unwrap();
    assert!(snapshot.annotations.is_empty());
    assert!(snapshot.measurements.is_empty());

    let mut engine = Controller::builtin(cephalometry::LATERAL).unwrap();
    engine.restore(&snapshot).unwrap();
    let ms = engine.measurements();
    assert_eq!(ms.len(), 1);
    assert!((ms[0].value - 1.5).abs() < 1e-12);
}

#[test]
fn test_save_and_load_file() {
    let engine = lateral_session();
    let snapshot = engine.snapshot();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    save_snapshot(&snapshot, &path).unwrap();
    let loaded = load_snapshot(&path).unwrap();
    assert_eq!(loaded, snapshot);

    let err = load_snapshot(dir.path().join("missing.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to read snapshot"));
}
