//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::TimestampUnit;
use std::path::PathBuf;

/// Gyro Syncer - time synchronization of two devices from gyroscope recordings
#[derive(Parser, Debug)]
#[command(
    name = "gyro-syncer",
    author,
    version,
    about = "Gyroscope based time synchronization of two recording devices",
    long_about = "Estimates the constant time offset between two gyroscope recordings.\n\n\
                  Correlates rotation invariant angular speed, calibrates the sensor \n\
                  frames against each other and refines the delay to sub-sample precision."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "GYRO_SYNCER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "GYRO_SYNCER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate the delay between two recordings on disk
    Estimate(EstimateArgs),

    /// Run the sync server for device uploads
    Serve(ServeArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `estimate` command
#[derive(Parser, Debug, Clone)]
pub struct EstimateArgs {
    /// Recording of the first (client) device, `x,y,z,t` lines
    #[arg(long)]
    pub first: PathBuf,

    /// Recording of the second (leader) device, `x,y,z,t` lines
    #[arg(long)]
    pub second: PathBuf,

    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "GYRO_SYNCER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override working accuracy in seconds
    #[arg(long, env = "GYRO_SYNCER_ACCURACY")]
    pub accuracy: Option<f64>,

    /// Use the recordings as-is instead of resampling to a uniform grid
    #[arg(long)]
    pub no_resample: bool,

    /// Fail instead of taking the real part when refinement finds complex roots
    #[arg(long)]
    pub reject_complex_roots: bool,

    /// Override timestamp unit of the recordings
    #[arg(long, value_enum)]
    pub timestamp_unit: Option<UnitArg>,

    /// Output the estimate as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `serve` command
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, env = "GYRO_SYNCER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override bind host from configuration
    #[arg(long, env = "GYRO_SYNCER_HOST")]
    pub host: Option<String>,

    /// Override bind port from configuration
    #[arg(long, env = "GYRO_SYNCER_PORT")]
    pub port: Option<u16>,

    /// Directory for persisting uploaded recordings
    #[arg(long, env = "GYRO_SYNCER_SAVE_DIR")]
    pub save_dir: Option<PathBuf>,

    /// Metrics server port (overrides configuration)
    #[arg(long, env = "GYRO_SYNCER_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Stop after this many sessions (0 = unlimited)
    #[arg(long, default_value = "0", env = "GYRO_SYNCER_MAX_SESSIONS")]
    pub max_sessions: u64,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "syncer.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

/// Timestamp unit of recording files
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum UnitArg {
    Ns,
    Us,
    Ms,
    S,
}

impl From<UnitArg> for TimestampUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Ns => Self::Nanoseconds,
            UnitArg::Us => Self::Microseconds,
            UnitArg::Ms => Self::Milliseconds,
            UnitArg::S => Self::Seconds,
        }
    }
}
