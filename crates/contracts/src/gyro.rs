//! GyroStream - estimator input
//!
//! Angular velocity samples (rad/s) paired with strictly increasing
//! timestamps (seconds).

use serde::{Deserialize, Serialize};

use crate::SyncError;

/// Minimum number of samples needed to build a spline over a stream
pub const MIN_STREAM_LEN: usize = 2;

/// A validated 3-axis gyroscope stream
///
/// Only constructible through [`GyroStream::new`], so every instance
/// satisfies: equal sample/timestamp counts, at least two samples, finite
/// values and strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GyroStream {
    samples: Vec<[f64; 3]>,
    timestamps: Vec<f64>,
}

impl GyroStream {
    /// Validate and wrap a stream
    pub fn new(samples: Vec<[f64; 3]>, timestamps: Vec<f64>) -> Result<Self, SyncError> {
        if samples.len() != timestamps.len() {
            return Err(SyncError::invalid_input(
                "samples",
                format!(
                    "sample count {} does not match timestamp count {}",
                    samples.len(),
                    timestamps.len()
                ),
            ));
        }

        if samples.len() < MIN_STREAM_LEN {
            return Err(SyncError::invalid_input(
                "samples",
                format!(
                    "need at least {MIN_STREAM_LEN} samples, got {}",
                    samples.len()
                ),
            ));
        }

        if let Some(idx) = samples
            .iter()
            .position(|s| s.iter().any(|v| !v.is_finite()))
        {
            return Err(SyncError::invalid_input(
                format!("samples[{idx}]"),
                "angular velocity must be finite",
            ));
        }

        if let Some(idx) = timestamps.iter().position(|t| !t.is_finite()) {
            return Err(SyncError::invalid_input(
                format!("timestamps[{idx}]"),
                "timestamp must be finite",
            ));
        }

        if let Some(idx) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SyncError::invalid_input(
                format!("timestamps[{}]", idx + 1),
                format!(
                    "timestamps must be strictly increasing ({} after {})",
                    timestamps[idx + 1],
                    timestamps[idx]
                ),
            ));
        }

        Ok(Self {
            samples,
            timestamps,
        })
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false: a valid stream has at least two samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[[f64; 3]] {
        &self.samples
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Time span from first to last sample (seconds)
    pub fn duration(&self) -> f64 {
        self.timestamps[self.timestamps.len() - 1] - self.timestamps[0]
    }

    /// Decompose into owned samples and timestamps
    pub fn into_parts(self) -> (Vec<[f64; 3]>, Vec<f64>) {
        (self.samples, self.timestamps)
    }
}

impl<'de> Deserialize<'de> for GyroStream {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            samples: Vec<[f64; 3]>,
            timestamps: Vec<f64>,
        }

        let raw = Raw::deserialize(deserializer)?;
        GyroStream::new(raw.samples, raw.timestamps).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> (Vec<[f64; 3]>, Vec<f64>) {
        let samples = (0..n).map(|i| [i as f64, 0.0, 1.0]).collect();
        let timestamps = (0..n).map(|i| i as f64 * 0.01).collect();
        (samples, timestamps)
    }

    #[test]
    fn test_valid_stream() {
        let (samples, timestamps) = ramp(11);
        let stream = GyroStream::new(samples, timestamps).unwrap();
        assert_eq!(stream.len(), 11);
        assert!((stream.duration() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_empty_and_single() {
        let err = GyroStream::new(vec![], vec![]).unwrap_err();
        assert!(matches!(err, SyncError::InvalidInput { .. }));

        let err = GyroStream::new(vec![[0.0; 3]], vec![0.0]).unwrap_err();
        assert!(err.to_string().contains("at least 2"), "got: {err}");
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let (samples, mut timestamps) = ramp(5);
        timestamps.pop();
        let err = GyroStream::new(samples, timestamps).unwrap_err();
        assert!(err.to_string().contains("does not match"), "got: {err}");
    }

    #[test]
    fn test_rejects_non_monotonic_timestamps() {
        let (samples, mut timestamps) = ramp(5);
        timestamps[3] = timestamps[2];
        let err = GyroStream::new(samples, timestamps).unwrap_err();
        assert!(err.to_string().contains("timestamps[3]"), "got: {err}");
    }

    #[test]
    fn test_rejects_nan_sample() {
        let (mut samples, timestamps) = ramp(5);
        samples[1][2] = f64::NAN;
        let err = GyroStream::new(samples, timestamps).unwrap_err();
        assert!(err.to_string().contains("samples[1]"), "got: {err}");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok = r#"{"samples": [[0,0,0],[1,1,1]], "timestamps": [0.0, 0.1]}"#;
        assert!(serde_json::from_str::<GyroStream>(ok).is_ok());

        let bad = r#"{"samples": [[0,0,0],[1,1,1]], "timestamps": [0.1, 0.0]}"#;
        assert!(serde_json::from_str::<GyroStream>(bad).is_err());
    }
}
