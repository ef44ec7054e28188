//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "pressmon", version, about = "Pressure channel monitor")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/pressmon.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty; results are printed as JSON
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
    /// Run one timed detection session and evaluate every channel
    Detect {
        /// Override session.duration_seconds
        #[arg(long, value_name = "SECONDS")]
        duration: Option<u64>,
        /// Override session.threshold (max |last - first| per channel)
        #[arg(long, value_name = "DELTA")]
        threshold: Option<f64>,
        /// Capture a fresh zero baseline before the session starts
        #[arg(long, action = ArgAction::SetTrue)]
        zero: bool,
    },
    /// Capture a zero baseline and print it
    Calibrate {
        /// Also write the baseline CSV (channel,baseline) to this file
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,
    },
    /// Quick health check: open the backend and take one probe batch
    SelfCheck,
    /// List serial ports reported by the OS
    ListPorts,
}
