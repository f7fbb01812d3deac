//! Clock offset between the two recording devices.

use contracts::SyncError;

/// Offset of the second device's clock relative to the first (seconds)
///
/// Mean timestamp difference over the common prefix plus the estimated
/// delay. Adding the result to a first-device timestamp maps it onto the
/// second device's clock.
pub fn clock_offset(first_ts: &[f64], second_ts: &[f64], delay_s: f64) -> Result<f64, SyncError> {
    let n = first_ts.len().min(second_ts.len());
    if n == 0 {
        return Err(SyncError::invalid_input(
            "timestamps",
            "clock offset needs at least one timestamp per stream",
        ));
    }
    if !delay_s.is_finite() {
        return Err(SyncError::invalid_input("delay_s", "delay must be finite"));
    }

    let mean_diff = first_ts[..n]
        .iter()
        .zip(&second_ts[..n])
        .map(|(a, b)| b - a)
        .sum::<f64>()
        / n as f64;

    Ok(mean_diff + delay_s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_offset() {
        let first = [0.0, 0.01, 0.02, 0.03];
        let second: Vec<f64> = first.iter().map(|t| t + 100.0).collect();
        let offset = clock_offset(&first, &second, 0.0).unwrap();
        assert!((offset - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_uses_common_prefix_and_adds_delay() {
        let first = [1.0, 2.0, 3.0];
        let second = [11.0, 12.0, 13.0, 14.0, 15.0];
        let offset = clock_offset(&first, &second, 0.25).unwrap();
        assert!((offset - 10.25).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_empty() {
        assert!(clock_offset(&[], &[1.0], 0.0).is_err());
        assert!(clock_offset(&[1.0], &[1.0], f64::NAN).is_err());
    }
}
