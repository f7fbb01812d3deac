//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{ComplexRootPolicy, SyncerConfig};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<SyncerConfig>,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            config: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                config: Some(config),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            config: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &SyncerConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.estimator.accuracy > 0.1 {
        warnings.push(format!(
            "estimator.accuracy = {} s is coarser than typical gyro sampling; \
             the mean sample interval will be used instead",
            config.estimator.accuracy
        ));
    }

    if !config.estimator.resample {
        warnings.push(
            "estimator.resample is disabled - recordings must already be uniformly sampled"
                .to_string(),
        );
    }

    if config.estimator.complex_roots == ComplexRootPolicy::RealPart {
        warnings.push(
            "estimator.complex_roots = real_part - flat correlation peaks are accepted silently"
                .to_string(),
        );
    }

    if config.server.save_dir.is_none() {
        warnings.push("server.save_dir is not set - uploads are kept in memory only".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref config) = result.config {
            println!("\n  Accuracy: {} s", config.estimator.accuracy);
            println!("  Resample: {}", config.estimator.resample);
            println!("  Complex roots: {:?}", config.estimator.complex_roots);
            println!("  Timestamp unit: {:?}", config.input.timestamp_unit);
            println!("  Server: {}:{}", config.server.host, config.server.port);
            if let Some(port) = config.server.metrics_port {
                println!("  Metrics port: {}", port);
            }
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
