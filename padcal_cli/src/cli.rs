//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "padcal", version, about = "Pressure pad calibration CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/padcal.toml")]
    pub config: PathBuf,

    /// Emit results and logs as JSON instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full statistics suite over one frame
    Analyze {
        /// Frame file (.csv or .json grid of readings)
        #[arg(value_name = "FRAME")]
        frame: PathBuf,
        /// Explicit active-cell threshold instead of mean-ratio
        #[arg(long, value_name = "VALUE")]
        threshold: Option<f64>,
        /// Skip the cluster analysis block
        #[arg(long, action = ArgAction::SetTrue)]
        no_clusters: bool,
    },
    /// Generate a per-cell correction map from a reference frame
    GenMap {
        /// Reference frame file (.csv or .json)
        #[arg(value_name = "FRAME")]
        frame: PathBuf,
        /// Output map path (.csv or .json)
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
        /// Target response (default: median of active cells)
        #[arg(long, value_name = "VALUE")]
        target: Option<f64>,
    },
    /// Apply a correction map to a frame and report the improvement
    ApplyMap {
        /// Frame file (.csv or .json)
        #[arg(value_name = "FRAME")]
        frame: PathBuf,
        /// Correction map (.csv or .json)
        #[arg(long, value_name = "FILE")]
        map: PathBuf,
        /// Write the corrected frame here instead of only reporting
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Convert a frame to a weight using the position registry
    Weigh {
        /// Frame file (.csv or .json)
        #[arg(value_name = "FRAME")]
        frame: PathBuf,
        /// Registry JSON with calibration positions
        #[arg(long, value_name = "FILE")]
        registry: PathBuf,
        /// Optional correction map applied before conversion
        #[arg(long, value_name = "FILE")]
        map: Option<PathBuf>,
        /// Optional tare frame; its corrected total becomes the zero point
        #[arg(long, value_name = "FILE")]
        tare: Option<PathBuf>,
    },
    /// Inspect or edit the position registry
    Registry {
        #[command(subcommand)]
        cmd: RegistryCmd,
    },
    /// Audit a consistency document for structural gaps
    Audit {
        /// Consistency document (.json)
        #[arg(value_name = "FILE")]
        doc: PathBuf,
    },
    /// Validate the config (and registry, if given) without running anything
    SelfCheck {
        /// Optional registry JSON to validate alongside the config
        #[arg(long, value_name = "FILE")]
        registry: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RegistryCmd {
    /// Print every position with its calibration parameters
    Summary {
        /// Registry JSON
        #[arg(value_name = "FILE")]
        registry: PathBuf,
    },
    /// Replace one position's calibration parameters
    Update {
        /// Registry JSON (modified in place)
        #[arg(value_name = "FILE")]
        registry: PathBuf,
        /// Position id to update
        #[arg(long)]
        id: String,
        #[arg(long)]
        slope: f64,
        #[arg(long)]
        intercept: f64,
        #[arg(long)]
        r_squared: f64,
        #[arg(long, default_value_t = 0)]
        measurement_count: u32,
    },
}
