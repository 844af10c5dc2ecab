//! PathCAM command line tool
//!
//! Usage:
//!   pathcam generate <project.toml> [-o <output.gcode>]
//!   pathcam parse <program.gcode> [--later-backfill] [--json]
//!   pathcam toolpaths <project.toml>

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pathcam::{
    generate_program, init_logging, project_toolpaths, read_program, BackfillPolicy, ProgramStats,
};

/// Turn polygon geometry into G-code
#[derive(Parser, Debug)]
#[command(name = "pathcam")]
#[command(author, version = version(), about, long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the G-code program for a project
    Generate {
        /// Project file (JSON or TOML)
        #[arg(value_name = "PROJECT")]
        project: PathBuf,

        /// Output G-code file, stdout when omitted
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Parse a G-code program and report on it
    Parse {
        /// G-code file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Resolve values used before their first assignment from the
        /// first value assigned later, instead of 0
        #[arg(long)]
        later_backfill: bool,

        /// Print the waypoints as JSON instead of statistics
        #[arg(long)]
        json: bool,
    },

    /// Print every operation's toolpath as geometry JSON
    Toolpaths {
        /// Project file (JSON or TOML)
        #[arg(value_name = "PROJECT")]
        project: PathBuf,
    },
}

fn version() -> &'static str {
    concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_json)?;

    match cli.command {
        Commands::Generate { project, output } => cmd_generate(&project, output.as_deref()),
        Commands::Parse {
            input,
            later_backfill,
            json,
        } => cmd_parse(&input, later_backfill, json),
        Commands::Toolpaths { project } => cmd_toolpaths(&project),
    }
}

fn cmd_generate(project: &Path, output: Option<&Path>) -> Result<()> {
    let lines = generate_program(project)?;
    let mut program = lines.join("\n");
    program.push('\n');

    match output {
        Some(path) => {
            fs::write(path, program).with_context(|| format!("writing {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => io::stdout()
            .lock()
            .write_all(program.as_bytes())
            .context("writing program to stdout")?,
    }
    Ok(())
}

fn cmd_parse(input: &Path, later_backfill: bool, json: bool) -> Result<()> {
    let policy = if later_backfill {
        BackfillPolicy::FirstLaterValue
    } else {
        BackfillPolicy::Zero
    };
    let program = read_program(input, policy)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&program.waypoints)?);
    } else {
        println!("{}", ProgramStats::from_waypoints(&program.waypoints));
        println!("Diagnostics:      {}", program.diagnostics.len());
    }
    Ok(())
}

fn cmd_toolpaths(project: &Path) -> Result<()> {
    let reports = project_toolpaths(project)?;
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
