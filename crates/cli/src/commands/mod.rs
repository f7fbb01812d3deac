//! Command implementations.

mod estimate;
mod serve;
mod validate;

pub use estimate::run_estimate;
pub use serve::run_serve;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::SyncerConfig;
use tracing::info;

/// Load a configuration file, or fall back to defaults when none is given
fn load_config(path: Option<&Path>) -> Result<SyncerConfig> {
    match path {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))
        }
        None => {
            info!("No configuration file given, using defaults");
            Ok(SyncerConfig::default())
        }
    }
}
