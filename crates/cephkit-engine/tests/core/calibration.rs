use cephkit_core::InputError;
use cephkit_engine::calibration::{
    CalibrationMode, CalibrationState, CaptureOutcome, FixedDistance, PixelSpacing, ReferenceObject,
};
use cephkit_engine::model::Point;

#[test]
fn test_fixed_distance_scale() {
    let mut cal = CalibrationState::new(CalibrationMode::FixedDistance {
        distance: FixedDistance::Ten,
    });
    assert_eq!(cal.capture(Point::new(0.0, 0.0)).unwrap(), CaptureOutcome::FirstPoint);
    assert!(cal.is_in_progress());
    assert!(!cal.is_calibrated());
    assert_eq!(cal.scale(), 1.0);

    let outcome = cal.capture(Point::new(100.0, 0.0)).unwrap();
    assert_eq!(outcome, CaptureOutcome::Completed { scale: 10.0 });
    assert!(cal.is_calibrated());
    assert_eq!(cal.scale(), 10.0);
    assert_eq!(cal.px_to_mm(55.0), 5.5);
}

#[test]
fn test_fixed_thirty_mm() {
    let mut cal = CalibrationState::new(CalibrationMode::FixedDistance {
        distance: FixedDistance::Thirty,
    });
    cal.capture(Point::new(10.0, 10.0)).unwrap();
    cal.capture(Point::new(10.0, 70.0)).unwrap();
    assert!((cal.scale() - 2.0).abs() < 1e-12);
    assert_eq!(cal.mode().point_labels(), ["0", "30"]);
}

#[test]
fn test_reference_object_scale() {
    let mode = CalibrationMode::reference(ReferenceObject::Implant).unwrap();
    let mut cal = CalibrationState::new(mode);
    cal.capture(Point::new(0.0, 0.0)).unwrap();
    cal.capture(Point::new(30.0, 40.0)).unwrap();
    assert!((cal.scale() - 5.0).abs() < 1e-12);
}

#[test]
fn test_reference_object_defaults() {
    assert_eq!(ReferenceObject::Implant.default_size_mm(), Some(10.0));
    assert_eq!(ReferenceObject::Crown.default_size_mm(), Some(8.0));
    assert_eq!(ReferenceObject::InterdentalDistance.default_size_mm(), Some(15.0));
    assert_eq!(ReferenceObject::Custom.default_size_mm(), None);
}

#[test]
fn test_rejects_non_positive_object_size() {
    for size in [0.0, -3.0, f64::NAN, f64::INFINITY] {
        let err = CalibrationMode::custom_object(size).unwrap_err();
        assert!(matches!(err, InputError::NonPositiveObjectSize { .. }));
    }

    let mut cal = CalibrationState::default();
    let before = cal.clone();
    assert!(cal.set_object_size(0.0).is_err());
    assert_eq!(cal, before);
}

#[test]
fn test_coincident_points_rejected() {
    let mut cal = CalibrationState::default();
    cal.capture(Point::new(5.0, 5.0)).unwrap();
    let err = cal.capture(Point::new(5.0, 5.0)).unwrap_err();
    assert_eq!(err, InputError::CoincidentCalibrationPoints);
    assert!(cal.is_in_progress());
    assert_eq!(cal.scale(), 1.0);
}

#[test]
fn test_click_after_completion_is_ignored() {
    let mut cal = CalibrationState::default();
    cal.capture(Point::new(0.0, 0.0)).unwrap();
    cal.capture(Point::new(10.0, 0.0)).unwrap();
    assert_eq!(cal.capture(Point::new(50.0, 0.0)).unwrap(), CaptureOutcome::AlreadyComplete);
    assert_eq!(cal.point2(), Some(Point::new(10.0, 0.0)));
}

#[test]
fn test_reset_returns_to_sentinel() {
    let mut cal = CalibrationState::default();
    cal.capture(Point::new(0.0, 0.0)).unwrap();
    cal.capture(Point::new(20.0, 0.0)).unwrap();
    cal.reset();
    assert_eq!(cal.scale(), 1.0);
    assert!(cal.points().is_empty());
    assert!(!cal.is_calibrated());
}

#[test]
fn test_mode_change_discards_calibration() {
    let mut cal = CalibrationState::default();
    cal.capture(Point::new(0.0, 0.0)).unwrap();
    cal.capture(Point::new(20.0, 0.0)).unwrap();
    cal.set_mode(CalibrationMode::FixedDistance {
        distance: FixedDistance::Thirty,
    })
    .unwrap();
    assert!(!cal.is_calibrated());
    assert_eq!(cal.scale(), 1.0);
}

#[test]
fn test_pixel_spacing_calibration() {
    let mut cal = CalibrationState::default();
    let scale = cal
        .calibrate_from_spacing(PixelSpacing {
            row_mm: 0.4,
            col_mm: 0.6,
        })
        .unwrap();
    assert!((scale - 2.0).abs() < 1e-12);
    assert!(cal.is_calibrated());

    let err = cal
        .calibrate_from_spacing(PixelSpacing {
            row_mm: 0.0,
            col_mm: 0.5,
        })
        .unwrap_err();
    assert!(matches!(err, InputError::InvalidRaster { .. }));
}

#[test]
fn test_restore_round_trip() {
    let mut cal = CalibrationState::new(CalibrationMode::reference(ReferenceObject::Crown).unwrap());
    cal.capture(Point::new(1.0, 2.0)).unwrap();
    cal.capture(Point::new(9.0, 2.0)).unwrap();
    let restored = CalibrationState::restore(*cal.mode(), &cal.points(), cal.scale()).unwrap();
    assert_eq!(restored, cal);

    let partial = CalibrationState::restore(*cal.mode(), &[Point::new(1.0, 2.0)], 1.0).unwrap();
    assert!(partial.is_in_progress());
    assert!(!partial.is_calibrated());
}

#[test]
fn test_mode_serde_tags() {
    let json = serde_json::to_string(&CalibrationMode::default()).unwrap();
    assert_eq!(json, r#"{"kind":"fixed_distance","distance":"10mm"}"#);
    let back: CalibrationMode = serde_json::from_str(&json).unwrap();
    assert_eq!(back, CalibrationMode::default());
}
