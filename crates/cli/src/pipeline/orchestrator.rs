//! Recording pair -> delay estimate -> clock offset.

use contracts::{DelayEstimate, EstimatorConfig, SyncError};
use ingestion::GyroRecording;
use serde::Serialize;
use sync_engine::{clock_offset, TimeSync};
use tracing::{info, instrument};

/// Result of synchronizing one recording pair
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SyncOutcome {
    pub estimate: DelayEstimate,

    /// Second device clock minus first device clock (seconds)
    pub clock_offset_s: f64,
}

impl SyncOutcome {
    pub fn clock_offset_ns(&self) -> f64 {
        self.clock_offset_s * 1e9
    }
}

/// Run the estimator on a client (first) and leader (second) recording
///
/// Blocking; the server calls it through `spawn_blocking`.
#[instrument(
    name = "run_estimation",
    skip(first, second),
    fields(first_len = first.len(), second_len = second.len())
)]
pub fn run_estimation(
    first: GyroRecording,
    second: GyroRecording,
    config: EstimatorConfig,
) -> Result<SyncOutcome, SyncError> {
    let first = first.into_stream()?;
    let second = second.into_stream()?;

    // Raw timestamps are needed for the clock offset after the streams move
    let first_ts = first.timestamps().to_vec();
    let second_ts = second.timestamps().to_vec();

    let mut sync = TimeSync::with_config(first, second, config);
    sync.resample(config.accuracy)?;
    let estimate = sync.estimate_delay()?;

    let clock_offset_s = clock_offset(&first_ts, &second_ts, estimate.delay_s)?;
    info!(
        delay_s = estimate.delay_s,
        clock_offset_s,
        "recordings synchronized"
    );

    Ok(SyncOutcome {
        estimate,
        clock_offset_s,
    })
}
