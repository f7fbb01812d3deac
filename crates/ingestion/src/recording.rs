//! Parsed gyro recording

use contracts::{GyroStream, SyncError, TimestampUnit};

/// Samples read from a recording, timestamps already converted to seconds
///
/// Unlike [`GyroStream`] this is not validated; [`into_stream`](Self::into_stream)
/// performs the checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GyroRecording {
    pub samples: Vec<[f64; 3]>,
    pub timestamps_s: Vec<f64>,
}

impl GyroRecording {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Validate into an estimator input
    pub fn into_stream(self) -> Result<GyroStream, SyncError> {
        GyroStream::new(self.samples, self.timestamps_s)
    }

    /// Render as `x,y,z,t` lines with `t` expressed in `unit`
    ///
    /// Sub-second units are written as integers, matching device recorders.
    pub fn to_csv(&self, unit: TimestampUnit) -> String {
        let factor = unit.to_seconds_factor();
        let mut out = String::with_capacity(self.len() * 64);
        for (s, t) in self.samples.iter().zip(&self.timestamps_s) {
            let line = match unit {
                TimestampUnit::Seconds => format!("{},{},{},{}\n", s[0], s[1], s[2], t),
                _ => format!(
                    "{},{},{},{}\n",
                    s[0],
                    s[1],
                    s[2],
                    (t / factor).round() as i64
                ),
            };
            out.push_str(&line);
        }
        out
    }
}

impl From<GyroStream> for GyroRecording {
    fn from(stream: GyroStream) -> Self {
        let (samples, timestamps_s) = stream.into_parts();
        Self {
            samples,
            timestamps_s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_samples() -> GyroRecording {
        GyroRecording {
            samples: vec![[0.5, -1.0, 0.25], [1.5, 0.0, -2.0]],
            timestamps_s: vec![12.5, 12.51],
        }
    }

    #[test]
    fn test_to_csv_integer_nanoseconds() {
        let csv = two_samples().to_csv(TimestampUnit::Nanoseconds);
        assert_eq!(csv, "0.5,-1,0.25,12500000000\n1.5,0,-2,12510000000\n");
    }

    #[test]
    fn test_to_csv_seconds_keeps_fraction() {
        let csv = two_samples().to_csv(TimestampUnit::Seconds);
        assert_eq!(csv.lines().count(), 2);
        assert_eq!(csv.lines().next(), Some("0.5,-1,0.25,12.5"));
    }
}
