use std::sync::Arc;

use cephkit_engine::catalogue::cephalometry;
use cephkit_engine::commands::EngineCommand;
use cephkit_engine::controller::Controller;
use cephkit_engine::model::CanvasPoint;
use cephkit_engine::raster::{ImageRaster, ImageSource, RasterPayload};
use cephkit_engine::report::{CONCLUSION_DEVIATING, CONCLUSION_NORMAL};
use cephkit_engine::tools::ToolMode;

/// Intraoral engine calibrated at 1 px/mm with the given landmark clicks.
fn intraoral(clicks: &[(f64, f64)]) -> Controller {
    let mut engine = Controller::builtin(cephalometry::INTRAORAL).unwrap();
    engine
        .apply(EngineCommand::ResizeCanvas {
            width: 300.0,
            height: 300.0,
        })
        .unwrap();
    let request = engine.request_raster(cephalometry::INTRAORAL, ImageSource::Handle(3)).unwrap();
    let payload = RasterPayload::new(Arc::new(ImageRaster::blank(300, 300).unwrap()));
    engine.on_raster_ready(request.generation, Ok(payload)).unwrap();
    engine.apply(EngineCommand::SelectTool(ToolMode::Calibrate)).unwrap();
    engine.apply(EngineCommand::Calibrate { at: CanvasPoint::new(10.0, 10.0) }).unwrap();
    engine.apply(EngineCommand::Calibrate { at: CanvasPoint::new(18.0, 10.0) }).unwrap();
    for &(x, y) in clicks {
        engine.apply(EngineCommand::PlacePoint { at: CanvasPoint::new(x, y) }).unwrap();
    }
    engine
}

#[test]
fn test_empty_report() {
    let engine = intraoral(&[]);
    let report = engine.report().unwrap();
    assert!(report.is_empty());
    assert!(report.all_normal);
    let text = report.to_text_table();
    assert!(text.starts_with("Cephalometry - Intraoral frontal (ceph.intraoral)"));
    assert!(text.contains("(no measurements yet)"));
    assert!(text.trim_end().ends_with(CONCLUSION_NORMAL));
}

#[test]
fn test_text_table_lists_measurements() {
    let engine = intraoral(&[(100.0, 100.0), (101.0, 100.0), (50.0, 150.0), (90.0, 150.0)]);
    let report = engine.report().unwrap();
    assert_eq!(report.measurements.len(), 2);
    assert!(report.all_normal);

    let text = report.to_text_table();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[2].starts_with("Parameter"));
    assert!(lines[2].contains("Interpretation"));
    assert!(lines[3].chars().all(|c| c == '-'));
    assert!(lines[4].starts_with("Midline deviation"));
    assert!(lines[4].contains("1.00 mm"));
    assert!(lines[4].contains("<=2 mm"));
    assert!(lines[5].starts_with("Inter-canine width"));
    assert!(lines[5].contains("40.00 mm"));
}

#[test]
fn test_deviation_changes_conclusion() {
    let engine = intraoral(&[(100.0, 100.0), (104.0, 100.0)]);
    let report = engine.report().unwrap();
    assert!(!report.all_normal);
    assert_eq!(report.conclusion, CONCLUSION_DEVIATING);
    assert!(report.to_text_table().contains("Midline shift"));
}

#[test]
fn test_csv_export() {
    let engine = intraoral(&[(100.0, 100.0), (104.0, 100.0)]);
    let csv = engine.report().unwrap().to_csv().unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "Key,Parameter,Value,Unit,Norm,Interpretation,Group");
    assert_eq!(lines[1], "midline_shift,Midline deviation,4.00,mm,<=2 mm,Midline shift,");

    let mut buf = Vec::new();
    engine.report().unwrap().write_csv(&mut buf).unwrap();
    assert_eq!(String::from_utf8(buf).unwrap(), csv);
}
