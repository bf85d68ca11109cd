use std::path::Path;

use cephkit::cli::{run, Cli};
use cephkit_settings::Config;
use tempfile::TempDir;

use super::write_png;

async fn cephkit(config: &Path, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["cephkit", "--config", config.to_str().unwrap()];
    argv.extend_from_slice(args);
    run(Cli::parse_args(argv)).await
}

#[tokio::test]
async fn test_config_init_and_force() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("cephkit").join("config.toml");

    cephkit(&config, &["config", "init"]).await.unwrap();
    assert_eq!(Config::load_from_file(&config).unwrap(), Config::default());

    let err = cephkit(&config, &["config", "init"]).await.unwrap_err();
    assert!(err.to_string().contains("already exists"));
    cephkit(&config, &["config", "init", "--force"]).await.unwrap();
}

#[tokio::test]
async fn test_analyze_writes_csv_report() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    let image = write_png(dir.path(), "teeth.png", 300, 300);
    let report = dir.path().join("report.csv");

    cephkit(
        &config,
        &[
            "analyze",
            image.to_str().unwrap(),
            "-p",
            "ceph.intraoral",
            "--calibration-point",
            "10,10",
            "--calibration-point",
            "18,10",
            "--point",
            "midline_upper=100,100",
            "--point",
            "midline_lower=104,100",
            "--format",
            "csv",
            "--output",
            report.to_str().unwrap(),
        ],
    )
    .await
    .unwrap();

    let csv = std::fs::read_to_string(&report).unwrap();
    assert!(csv.contains("midline_shift,Midline deviation,4.00,mm,<=2 mm,Midline shift,"));
}

#[tokio::test]
async fn test_snapshot_is_remembered() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    Config::default().save_to_file(&config).unwrap();
    let image = write_png(dir.path(), "teeth.png", 300, 300);
    let snapshot = dir.path().join("session.json");

    cephkit(
        &config,
        &[
            "analyze",
            image.to_str().unwrap(),
            "-p",
            "ceph.intraoral",
            "--output",
            dir.path().join("report.txt").to_str().unwrap(),
            "--save-snapshot",
            snapshot.to_str().unwrap(),
        ],
    )
    .await
    .unwrap();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&snapshot).unwrap()).unwrap();
    assert_eq!(json["projection_type"], "ceph.intraoral");
    assert_eq!(Config::load_from_file(&config).unwrap().recent_sessions, vec![snapshot]);
}

#[tokio::test]
async fn test_render_with_magnifier() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    let image = write_png(dir.path(), "teeth.png", 300, 200);
    let output = dir.path().join("out").join("render.png");

    cephkit(
        &config,
        &[
            "render",
            image.to_str().unwrap(),
            "-p",
            "ceph.intraoral",
            "--output",
            output.to_str().unwrap(),
            "--magnifier",
            "150,100",
        ],
    )
    .await
    .unwrap();

    let rendered = image::open(&output).unwrap();
    assert_eq!((rendered.width(), rendered.height()), (300, 200));
    let inset = image::open(dir.path().join("out").join("render-magnifier.png")).unwrap();
    assert_eq!((inset.width(), inset.height()), (200, 200));
}

#[tokio::test]
async fn test_unknown_projection() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    let image = write_png(dir.path(), "x.png", 10, 10);
    let result = cephkit(&config, &["analyze", image.to_str().unwrap(), "-p", "ceph.unknown"]).await;
    assert!(result.is_err());
}
