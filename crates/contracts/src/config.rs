//! Syncer configuration contracts shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default working accuracy (seconds)
pub const DEFAULT_ACCURACY_S: f64 = 1e-3;

/// Default cap on resampled rows per stream (about 67 minutes at 1 ms)
pub const DEFAULT_MAX_GRID_LEN: usize = 4_000_000;

/// Default sync server port
pub const DEFAULT_SERVER_PORT: u16 = 9428;

/// Default per-upload read timeout (milliseconds)
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 30_000;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncerConfig {
    /// Estimator settings
    #[serde(default)]
    pub estimator: EstimatorConfig,

    /// Recording input settings
    #[serde(default)]
    pub input: InputConfig,

    /// Sync server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Delay estimator configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Upper bound on the working sample interval (seconds)
    pub accuracy: f64,

    /// Resample both streams onto a uniform grid before correlating
    pub resample: bool,

    /// What to do when the peak segment's derivative has no real roots
    pub complex_roots: ComplexRootPolicy,

    /// Upper bound on rows of a resampled stream
    pub max_grid_len: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            accuracy: DEFAULT_ACCURACY_S,
            resample: true,
            complex_roots: ComplexRootPolicy::default(),
            max_grid_len: DEFAULT_MAX_GRID_LEN,
        }
    }
}

/// Handling of non-real roots during sub-sample refinement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexRootPolicy {
    /// Keep the real part of both roots and continue (logs a warning)
    #[default]
    RealPart,
    /// Abort the run with `SyncError::ComplexRoots`
    Reject,
}

/// Recording input configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Unit of the timestamp column
    pub timestamp_unit: TimestampUnit,
}

/// Unit of recorded timestamps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampUnit {
    /// Android `SensorEvent.timestamp`
    #[default]
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
}

impl TimestampUnit {
    /// Multiplier converting this unit into seconds
    pub fn to_seconds_factor(self) -> f64 {
        match self {
            Self::Nanoseconds => 1e-9,
            Self::Microseconds => 1e-6,
            Self::Milliseconds => 1e-3,
            Self::Seconds => 1.0,
        }
    }
}

/// Sync server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Chunk size used when reading uploaded recordings
    pub read_buffer_size: usize,

    /// Prometheus exporter port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Directory to persist uploaded recordings (None = keep in memory only)
    pub save_dir: Option<PathBuf>,

    /// Time allowed for one device to finish its upload (milliseconds)
    pub read_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_SERVER_PORT,
            read_buffer_size: 2048,
            metrics_port: None,
            save_dir: None,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}
