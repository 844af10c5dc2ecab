//! # PathCAM
//!
//! A 2D CAM engine that turns polygon geometry into G-code:
//! - Fixed-point polygon algebra (offset, boolean operations, cleaning)
//! - Toolpath strategies: drill, engrave, inside/outside profiles,
//!   perforation, annular and raster pockets
//! - Multi-pass depth planning with optional ramping
//! - A minimal G-code emitter and the matching parser
//!
//! ## Architecture
//!
//! PathCAM is organized as a workspace with multiple crates:
//!
//! 1. **pathcam-core** - Geometry types, units, machine state, errors
//! 2. **pathcam-designer** - Path algebra, toolpaths, depth planning, G-code output
//! 3. **pathcam-visualizer** - G-code parsing and program statistics
//! 4. **pathcam-settings** - Project files (JSON or TOML)
//! 5. **pathcam** - Logging setup and the `pathcam` command line tool

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

pub use pathcam_core::{
    Bounds, Error, FillRule, GcodeError, GeometryError, MachineState, ParameterError, PathSet,
    Point, Units,
};
pub use pathcam_designer::{
    boolean_op, clean, emit_program, generate_toolpath, offset, BooleanOp, CutDirection,
    JobParams, JoinType, Operation, OperationKind, OperationParams, OriginMode, RingOrder,
    Toolpath,
};
pub use pathcam_settings::{GeometrySource, OperationConfig, ProjectConfig, SettingsError};
pub use pathcam_visualizer::{
    parse_program, BackfillPolicy, ParsedProgram, ProgramParser, ProgramStats, Waypoint,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Log lines go to stderr so program output on stdout stays clean.
/// `RUST_LOG` takes precedence; otherwise `verbose` picks the level:
/// 0 = warn, 1 = info, 2 = debug, 3+ = trace. `json` switches to one JSON
/// object per event.
pub fn init_logging(verbose: u8, json: bool) -> Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_line_number(true),
            )
            .try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to initialise logging: {}", e))
}

/// Load a project file and build its operations, resolving geometry files
/// next to the project.
pub fn load_project(path: &Path) -> Result<(ProjectConfig, Vec<Operation>)> {
    let config = ProjectConfig::load_from_file(path)
        .with_context(|| format!("loading project {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let operations = config
        .build_operations(base_dir)
        .with_context(|| format!("building operations for {}", path.display()))?;
    Ok((config, operations))
}

/// The complete G-code program for a project file.
pub fn generate_program(project: &Path) -> Result<Vec<String>> {
    let (config, operations) = load_project(project)?;
    let lines = emit_program(&operations, &config.job)
        .with_context(|| format!("generating G-code for {}", project.display()))?;
    tracing::info!(
        "{}: {} operations, {} lines",
        project.display(),
        operations.len(),
        lines.len()
    );
    Ok(lines)
}

/// One operation's toolpath, as reported by `pathcam toolpaths`.
#[derive(Debug, Serialize)]
pub struct ToolpathReport {
    pub name: String,
    pub kind: OperationKind,
    pub generates_z: bool,
    pub skipped_features: usize,
    pub paths: PathSet,
}

/// Toolpaths of every operation in a project, in order.
pub fn project_toolpaths(project: &Path) -> Result<Vec<ToolpathReport>> {
    let (_, operations) = load_project(project)?;
    Ok(operations
        .into_iter()
        .map(|op| {
            let toolpath = generate_toolpath(op.kind, &op.operand, &op.params);
            ToolpathReport {
                name: op.name,
                kind: op.kind,
                generates_z: toolpath.generates_z,
                skipped_features: toolpath.skipped_features,
                paths: toolpath.paths,
            }
        })
        .collect())
}

/// Read and parse a G-code file.
pub fn read_program(path: &Path, policy: BackfillPolicy) -> Result<ParsedProgram> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let lines: Vec<&str> = content.lines().collect();
    Ok(ProgramParser::with_policy(policy).parse(&lines))
}
