//! DelayEstimate - Sync Engine output
//!
//! Result of a single delay estimation run.

use serde::{Deserialize, Serialize};

/// Outcome of one estimation run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayEstimate {
    /// Time delay between stream starts (seconds)
    ///
    /// Positive means the second stream lags the first.
    pub delay_s: f64,

    /// Working sample spacing used for resampling and lag conversion
    pub sample_interval_s: f64,

    /// Signed integer lag found on the uncalibrated magnitude signals
    pub coarse_lag: i64,

    /// Index into the refined correlation curve of the segment holding the peak
    pub peak_index: usize,

    /// Whether the peak was moved back one segment because of a negative slope
    pub boundary_corrected: bool,

    /// Sub-sample position of the maximum inside the peak segment
    pub fractional_offset: f64,

    /// Calibration matrix (row-major), `second ≈ M · first`
    pub calibration: [[f64; 3]; 3],
}

impl DelayEstimate {
    /// Delay expressed in working samples
    pub fn delay_samples(&self) -> f64 {
        self.delay_s / self.sample_interval_s
    }
}
