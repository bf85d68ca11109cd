//! # cephkit
//!
//! Landmark placement, calibration and measurement for medical images.
//!
//! ## Architecture
//!
//! cephkit is organized as a workspace with multiple crates:
//!
//! 1. **cephkit-core** - Error types, units, viewport policy, defaults
//! 2. **cephkit-engine** - Viewport, calibration, point store, catalogue,
//!    controller, renderer, report and snapshot
//! 3. **cephkit-settings** - Configuration file handling
//! 4. **cephkit** - Command line host that drives the engine
//!
//! The binary stands in for an interactive viewer: it decodes an image,
//! replays calibration clicks and landmark placements through the same
//! command path a GUI would use, and prints the resulting report.

pub mod cli;
pub mod options;
pub mod session;

pub use cephkit_core::{Error, InputError, Result};
pub use cephkit_engine::{Catalogue, Controller, EngineCommand, EngineOptions, RenderStyle};
pub use cephkit_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Sets up structured logging with:
/// - Output on stderr so reports on stdout stay clean
/// - RUST_LOG environment variable support
/// - JSON lines when `json` is set
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    if json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    } else {
        let fmt_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}
