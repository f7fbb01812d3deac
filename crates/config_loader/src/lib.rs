//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Produce a `SyncerConfig`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("syncer.toml")).unwrap();
//! println!("accuracy: {}", config.estimator.accuracy);
//! ```

mod parser;
mod validator;

pub use contracts::SyncerConfig;
pub use parser::ConfigFormat;
pub use validator::validate_estimator;

use contracts::SyncError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<SyncerConfig, SyncError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<SyncerConfig, SyncError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }

    /// Check an in-memory configuration, e.g. after CLI overrides
    pub fn validate(config: &SyncerConfig) -> Result<(), SyncError> {
        validator::validate(config)
    }

    /// Serialize SyncerConfig to TOML string
    pub fn to_toml(config: &SyncerConfig) -> Result<String, SyncError> {
        toml::to_string_pretty(config)
            .map_err(|e| SyncError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize SyncerConfig to JSON string
    pub fn to_json(config: &SyncerConfig) -> Result<String, SyncError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| SyncError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, SyncError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            SyncError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| SyncError::config_parse(format!("unsupported config format: .{ext}")))
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, SyncError> {
        Ok(std::fs::read_to_string(path)?)
    }
}
