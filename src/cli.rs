//! Command line interface.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cephkit_engine::renderer::to_rgba_image;
use cephkit_engine::serialization::save_snapshot;
use cephkit_engine::{Catalogue, Controller, EngineCommand, PixelSpacing, Point, Renderer, Scene};
use cephkit_settings::{default_config_path, Config};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::options::render_style;
use crate::session::{open_session, parse_point, parse_spacing, LandmarkAssignment, SessionRequest};

#[derive(Debug, Parser)]
#[command(name = "cephkit")]
#[command(about = "Landmark analysis for cephalometric, photometric and CT images")]
#[command(version)]
pub struct Cli {
    /// Configuration file (.toml or .json); defaults to the user config
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the projection catalogue.
    Projections,
    /// Load an image, apply edits and print the measurement report.
    Analyze {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
        /// Write the report here instead of stdout
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Write the resulting session snapshot
        #[arg(long, value_name = "FILE")]
        save_snapshot: Option<PathBuf>,
    },
    /// Render the annotated image to a PNG.
    Render {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
        /// Also write a magnifier inset centred on this image point
        #[arg(long, value_name = "X,Y", value_parser = parse_point)]
        magnifier: Option<Point>,
    },
    /// Print or initialize the configuration file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Print the configuration file location.
    Path,
    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Csv,
}

#[derive(Debug, Args)]
struct SessionArgs {
    #[arg(value_name = "IMAGE")]
    image: PathBuf,
    /// Projection key, e.g. ceph.lateral
    #[arg(long, short)]
    projection: Option<String>,
    /// Restore a saved session before applying edits
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,
    /// Calibration reference point in image pixels (given twice)
    #[arg(long = "calibration-point", value_name = "X,Y", value_parser = parse_point)]
    calibration_points: Vec<Point>,
    /// Physical pixel spacing in millimetres
    #[arg(long, value_name = "ROW,COL", value_parser = parse_spacing)]
    pixel_spacing: Option<PixelSpacing>,
    /// Reference object size in millimetres
    #[arg(long, value_name = "MM")]
    object_size: Option<f64>,
    /// Landmark position in image pixels
    #[arg(long = "point", value_name = "ID=X,Y")]
    points: Vec<LandmarkAssignment>,
}

impl From<SessionArgs> for SessionRequest {
    fn from(args: SessionArgs) -> Self {
        Self {
            image: args.image,
            projection: args.projection,
            snapshot: args.snapshot,
            calibration_points: args.calibration_points,
            pixel_spacing: args.pixel_spacing,
            object_size_mm: args.object_size,
            assignments: args.points,
        }
    }
}

impl Cli {
    pub fn parse_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::parse_from(args)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    match cli.command {
        Commands::Projections => {
            print_projections(&Catalogue::builtin());
            Ok(())
        }
        Commands::Analyze {
            session,
            format,
            output,
            save_snapshot: snapshot_out,
        } => {
            let mut config = Config::load_or_default(&config_path)?;
            let engine = open_session(&session.into(), &config).await?;
            let report = engine.report()?;
            let text = match format {
                ReportFormat::Text => report.to_text_table(),
                ReportFormat::Csv => report.to_csv()?,
            };
            write_output(output.as_deref(), &text)?;

            if let Some(path) = snapshot_out {
                save_snapshot(&engine.snapshot(), &path)?;
                remember_session(&mut config, &config_path, path);
            }
            Ok(())
        }
        Commands::Render {
            session,
            output,
            magnifier,
        } => {
            let config = Config::load_or_default(&config_path)?;
            let engine = open_session(&session.into(), &config).await?;
            render(engine, &config, &output, magnifier)
        }
        Commands::Config { action } => run_config(action, &config_path),
    }
}

fn print_projections(catalogue: &Catalogue) {
    for config in catalogue.iter() {
        println!(
            "{:<18} {:<14} {} ({} landmarks, {} measurements)",
            config.key,
            config.module.to_string(),
            config.label,
            config.landmarks.len(),
            config.measurements.len()
        );
    }
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("Wrote report to {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

/// Records the snapshot in the recent list when a config file is in use.
fn remember_session(config: &mut Config, config_path: &Path, snapshot: PathBuf) {
    if !config_path.exists() {
        return;
    }
    config.add_recent_session(snapshot);
    if let Err(e) = config.save_to_file(config_path) {
        tracing::warn!("Could not update recent sessions: {}", e);
    }
}

fn render(mut engine: Controller, config: &Config, output: &Path, magnifier: Option<Point>) -> Result<()> {
    let renderer = Renderer::new(render_style(config));
    let pixmap = renderer.render(&Scene::from_controller(&engine)?)?;
    save_png(&to_rgba_image(&pixmap), output)?;

    if let Some(center) = magnifier {
        let at = engine.state().mapper().to_canvas_space(&center);
        engine.apply(EngineCommand::ToggleMagnifier { at })?;
        let inset = renderer
            .render_magnifier(
                &Scene::from_controller(&engine)?,
                config.viewer.magnifier_zoom,
                config.viewer.magnifier_size_px,
            )?
            .context("magnifier did not switch on")?;
        let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("render");
        save_png(&to_rgba_image(&inset), &output.with_file_name(format!("{stem}-magnifier.png")))?;
    }
    Ok(())
}

fn save_png(image: &image::RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    image
        .save(path)
        .with_context(|| format!("failed to write image to {}", path.display()))?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

fn run_config(action: ConfigAction, path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default(path)?;
            print!("{}", toml_text(&config)?);
        }
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            Config::default().save_to_file(path)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn toml_text(config: &Config) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}
