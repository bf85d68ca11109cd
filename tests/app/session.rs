use cephkit::session::{open_session, LandmarkAssignment, SessionRequest};
use cephkit_engine::serialization::save_snapshot;
use cephkit_engine::{PixelSpacing, Point};
use cephkit_settings::Config;
use tempfile::TempDir;

use super::write_png;

fn assign(s: &str) -> LandmarkAssignment {
    s.parse().unwrap()
}

/// Intraoral session calibrated on an 8 px crown.
fn intraoral(dir: &TempDir, points: &[&str]) -> SessionRequest {
    SessionRequest {
        image: write_png(dir.path(), "intraoral.png", 300, 300),
        projection: Some("ceph.intraoral".into()),
        calibration_points: vec![Point::new(10.0, 10.0), Point::new(18.0, 10.0)],
        assignments: points.iter().map(|s| assign(s)).collect(),
        ..SessionRequest::default()
    }
}

#[tokio::test]
async fn test_session_places_landmarks() {
    let dir = TempDir::new().unwrap();
    let request = intraoral(&dir, &["midline_upper=100,100", "midline_lower=104,100"]);
    let engine = open_session(&request, &Config::default()).await.unwrap();

    assert!(engine.state().calibration().is_calibrated());
    assert_eq!(engine.state().calibration().scale(), 1.0);
    assert_eq!(engine.state().points().get("midline_lower"), Some(Point::new(104.0, 100.0)));
    assert_eq!(engine.next_to_place().as_deref(), Some("canine_R"));

    let report = engine.report().unwrap();
    assert!(!report.all_normal);
    assert_eq!(report.measurements[0].key, "midline_shift");
    assert!((report.measurements[0].value - 4.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_configured_reference_size() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.calibration.reference_sizes_mm.insert("crown".into(), 16.0);
    let request = intraoral(&dir, &["midline_upper=100,100", "midline_lower=104,100"]);
    let engine = open_session(&request, &config).await.unwrap();

    assert_eq!(engine.state().calibration().scale(), 0.5);
    assert!((engine.measurements()[0].value - 8.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_out_of_order_assignment_is_rejected() {
    let dir = TempDir::new().unwrap();
    let request = intraoral(&dir, &["canine_R=50,150"]);
    let err = open_session(&request, &Config::default()).await.err().unwrap();
    assert!(err.to_string().contains("next landmark is midline_upper"));
}

#[tokio::test]
async fn test_unknown_landmark_is_rejected() {
    let dir = TempDir::new().unwrap();
    let request = intraoral(&dir, &["Zz=1,1"]);
    let err = open_session(&request, &Config::default()).await.err().unwrap();
    assert!(err.to_string().contains("has no landmark Zz"));
}

#[tokio::test]
async fn test_snapshot_then_move() {
    let dir = TempDir::new().unwrap();
    let first = intraoral(&dir, &["midline_upper=100,100", "midline_lower=104,100"]);
    let engine = open_session(&first, &Config::default()).await.unwrap();
    let snapshot_path = dir.path().join("session.json");
    save_snapshot(&engine.snapshot(), &snapshot_path).unwrap();

    let second = SessionRequest {
        image: first.image.clone(),
        snapshot: Some(snapshot_path),
        assignments: vec![assign("midline_lower=101,100")],
        ..SessionRequest::default()
    };
    let engine = open_session(&second, &Config::default()).await.unwrap();

    assert_eq!(engine.state().projection(), "ceph.intraoral");
    assert!(engine.state().calibration().is_calibrated());
    assert_eq!(engine.state().points().get("midline_lower"), Some(Point::new(101.0, 100.0)));
    assert!((engine.measurements()[0].value - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_snapshot_projection_mismatch() {
    let dir = TempDir::new().unwrap();
    let first = intraoral(&dir, &[]);
    let engine = open_session(&first, &Config::default()).await.unwrap();
    let snapshot_path = dir.path().join("session.json");
    save_snapshot(&engine.snapshot(), &snapshot_path).unwrap();

    let second = SessionRequest {
        image: first.image.clone(),
        projection: Some("ceph.lateral".into()),
        snapshot: Some(snapshot_path),
        ..SessionRequest::default()
    };
    let err = open_session(&second, &Config::default()).await.err().unwrap();
    assert!(err.to_string().contains("snapshot is for ceph.intraoral"));
}

#[tokio::test]
async fn test_calibration_outside_image() {
    let dir = TempDir::new().unwrap();
    let mut request = intraoral(&dir, &[]);
    request.calibration_points = vec![Point::new(10.0, 10.0), Point::new(500.0, 10.0)];
    let err = open_session(&request, &Config::default()).await.err().unwrap();
    assert!(err.to_string().contains("inside the image"));
}

#[tokio::test]
async fn test_pixel_spacing_calibration() {
    let dir = TempDir::new().unwrap();
    let request = SessionRequest {
        image: write_png(dir.path(), "axial.png", 64, 64),
        projection: Some("ct.axial".into()),
        pixel_spacing: Some(PixelSpacing {
            row_mm: 0.25,
            col_mm: 0.25,
        }),
        ..SessionRequest::default()
    };
    let engine = open_session(&request, &Config::default()).await.unwrap();
    assert!(engine.state().calibration().is_calibrated());
    assert!((engine.state().calibration().scale() - 4.0).abs() < 1e-12);
}

#[tokio::test]
async fn test_missing_image() {
    let dir = TempDir::new().unwrap();
    let request = SessionRequest {
        image: dir.path().join("missing.png"),
        ..SessionRequest::default()
    };
    let err = open_session(&request, &Config::default()).await.err().unwrap();
    assert!(format!("{err:#}").contains("failed to load"));
}
