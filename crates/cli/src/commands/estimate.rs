//! `estimate` command implementation.

use anyhow::{Context, Result};
use contracts::ComplexRootPolicy;
use serde::Serialize;
use tracing::info;

use crate::cli::EstimateArgs;
use crate::pipeline::{run_estimation, SyncOutcome};

#[derive(Serialize)]
struct EstimateReport<'a> {
    first: String,
    second: String,
    #[serde(flatten)]
    outcome: &'a SyncOutcome,
}

/// Execute the `estimate` command
pub fn run_estimate(args: &EstimateArgs) -> Result<()> {
    let mut config = super::load_config(args.config.as_deref())?;

    // Apply CLI overrides
    if let Some(accuracy) = args.accuracy {
        info!(accuracy, "Overriding accuracy from CLI");
        config.estimator.accuracy = accuracy;
    }
    if args.no_resample {
        config.estimator.resample = false;
    }
    if args.reject_complex_roots {
        config.estimator.complex_roots = ComplexRootPolicy::Reject;
    }
    if let Some(unit) = args.timestamp_unit {
        config.input.timestamp_unit = unit.into();
    }
    config_loader::validate_estimator(&config.estimator).context("Invalid estimator settings")?;

    let unit = config.input.timestamp_unit;
    let first = ingestion::read_recording(&args.first, unit)
        .with_context(|| format!("Failed to read {}", args.first.display()))?;
    let second = ingestion::read_recording(&args.second, unit)
        .with_context(|| format!("Failed to read {}", args.second.display()))?;

    info!(
        first_samples = first.len(),
        second_samples = second.len(),
        accuracy = config.estimator.accuracy,
        resample = config.estimator.resample,
        "Recordings loaded"
    );

    let outcome =
        run_estimation(first, second, config.estimator).context("Delay estimation failed")?;

    if args.json {
        let report = EstimateReport {
            first: args.first.display().to_string(),
            second: args.second.display().to_string(),
            outcome: &outcome,
        };
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize estimate")?;
        println!("{json}");
    } else {
        print_outcome(&outcome);
    }

    Ok(())
}

fn print_outcome(outcome: &SyncOutcome) {
    let e = &outcome.estimate;
    println!("\n=== Delay Estimate ===\n");
    println!("  Delay: {:.6} s ({:.3} samples)", e.delay_s, e.delay_samples());
    println!("  Clock offset: {:.9} s", outcome.clock_offset_s);
    println!("  Sample interval: {:.6} s", e.sample_interval_s);
    println!("  Coarse lag: {} samples", e.coarse_lag);
    println!(
        "  Peak: segment {} + {:.4}{}",
        e.peak_index,
        e.fractional_offset,
        if e.boundary_corrected { " (corrected)" } else { "" }
    );
    println!("  Calibration:");
    for row in &e.calibration {
        println!("    [{:>9.5} {:>9.5} {:>9.5}]", row[0], row[1], row[2]);
    }
    println!();
}
