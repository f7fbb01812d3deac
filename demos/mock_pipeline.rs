//! Mock Pipeline Demo
//!
//! Simulates two devices recording the same motion with a clock offset, a
//! sensor delay and a rotated sensor frame, then recovers the offset.
//! No real devices needed.
//!
//! Run with: cargo run -p demos --bin mock_pipeline [-- syncer.toml]

use config_loader::ConfigLoader;
use contracts::SyncerConfig;
use ingestion::{parse_recording, MockGyroConfig, MockGyroSource};
use observability::{EstimationStatsAggregator, LogFormat, ObservabilityConfig};
use sync_engine::{clock_offset, TimeSync};

const CLOCK_OFFSET_S: f64 = 1_712.25;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::init_with_config(ObservabilityConfig {
        log_format: LogFormat::Compact,
        ..ObservabilityConfig::default()
    })?;

    tracing::info!("Starting Mock Pipeline Demo");

    // ==== Stage 1: Config from file or defaults ====
    let config = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading syncer config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        SyncerConfig::default()
    };
    let unit = config.input.timestamp_unit;

    // ==== Stage 2: Record on both devices ====
    let mut stats = EstimationStatsAggregator::new();
    for (run, delay_s) in [0.0137, -0.0421, 0.0968].into_iter().enumerate() {
        let client = MockGyroSource::new(MockGyroConfig {
            start_time_s: 10.0,
            noise_amplitude: 0.001,
            seed: run as u64,
            ..MockGyroConfig::default()
        })
        .recording()?;
        let leader = MockGyroSource::new(MockGyroConfig {
            start_time_s: 10.0 + CLOCK_OFFSET_S,
            delay_s,
            rotation: [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            noise_amplitude: 0.001,
            seed: 100 + run as u64,
            ..MockGyroConfig::default()
        })
        .recording()?;

        // ==== Stage 3: Ship as CSV the way the devices upload ====
        let first = parse_recording(&client.to_csv(unit), unit)?.into_stream()?;
        let second = parse_recording(&leader.to_csv(unit), unit)?.into_stream()?;
        let first_ts = first.timestamps().to_vec();
        let second_ts = second.timestamps().to_vec();

        // ==== Stage 4: Estimate ====
        let mut sync = TimeSync::with_config(first, second, config.estimator);
        match sync.estimate_delay() {
            Ok(estimate) => {
                let offset = clock_offset(&first_ts, &second_ts, estimate.delay_s)?;
                tracing::info!(
                    run,
                    expected_delay_s = delay_s,
                    delay_s = estimate.delay_s,
                    clock_offset_s = offset,
                    error_us = (offset - CLOCK_OFFSET_S - delay_s) * 1e6,
                    "Run finished"
                );
                stats.record_success(&estimate, Some(offset));
            }
            Err(e) => {
                tracing::error!(run, error = %e, "Estimation failed");
                stats.record_failure(e.kind());
            }
        }
    }

    println!("{}", stats.summary());
    Ok(())
}
