//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Activity Monitor - streaming activity classification for wearable IMUs
#[derive(Parser, Debug)]
#[command(
    name = "activity-monitor",
    author,
    version,
    about = "Streaming activity classification for wearable IMU sensors",
    long_about = "Classifies windows of accelerometer and gyroscope samples into an activity,\n\
                  refines the activity into a posture or motion, counts steps while\n\
                  walking or running, and dispatches each result to the configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "ACTIVITY_MONITOR_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "ACTIVITY_MONITOR_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify live (mock) or recorded streams
    Run(RunArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),

    /// Evaluate a model over labelled recordings
    Evaluate(EvaluateArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "monitor.toml",
        env = "ACTIVITY_MONITOR_CONFIG"
    )]
    pub config: PathBuf,

    /// Replay a JSONL recording instead of generating mock samples
    #[arg(long, env = "ACTIVITY_MONITOR_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Playback speed multiplier for mock and replay sources
    #[arg(long, default_value = "1.0")]
    pub speed: f64,

    /// Restart the recording or mock script when it ends
    #[arg(long = "loop")]
    pub loop_playback: bool,

    /// Emit samples as fast as possible instead of at the sample rate
    #[arg(long)]
    pub fast: bool,

    /// Stop after this many results (0 = unlimited)
    #[arg(long, default_value = "0", env = "ACTIVITY_MONITOR_MAX_RESULTS")]
    pub max_results: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "ACTIVITY_MONITOR_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Result channel size between engines and the dispatcher
    #[arg(long, default_value = "100", env = "ACTIVITY_MONITOR_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "ACTIVITY_MONITOR_METRICS_PORT")]
    pub metrics_port: u16,
}

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "monitor.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "monitor.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show per-stream pipeline tuning
    #[arg(long)]
    pub streams: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Labelled recordings (CSV or JSONL, one row per sample)
    #[arg(short, long)]
    pub recordings: PathBuf,

    /// Configuration providing pipeline tuning and the model
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Linear model file, overrides the configured model
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Rows between the starts of consecutive windows
    #[arg(long, default_value = "25")]
    pub step: usize,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
