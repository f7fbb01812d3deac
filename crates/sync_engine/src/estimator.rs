//! Delay estimator.
//!
//! `TimeSync` owns both gyro streams and runs the estimation stages in order:
//! resample, magnitude correlation, calibration, re-correlation, spline fit
//! and sub-sample root solve.

use contracts::{ComplexRootPolicy, DelayEstimate, EstimatorConfig, GyroStream, SyncError};
use nalgebra::Matrix3;
use rustfft::num_complex::Complex64;
use tracing::instrument;

use crate::calibration::{align_overlap, apply_calibration, solve_calibration};
use crate::numeric::{
    mean_interval, range, range_len, row_norms, signed_lag, solve_quadratic, to_matrix,
    CorrelationCurve, GyroMatrix,
};
use crate::spline::{interpolate, CubicSpline, SegmentCoefficients};

/// One stream's working copy
#[derive(Debug, Clone)]
struct Track {
    timestamps: Vec<f64>,
    samples: GyroMatrix,
}

impl Track {
    fn from_stream(stream: GyroStream) -> Self {
        let (samples, timestamps) = stream.into_parts();
        Self {
            samples: to_matrix(&samples),
            timestamps,
        }
    }

    fn len(&self) -> usize {
        self.samples.nrows()
    }

    fn mean_interval(&self) -> Result<f64, SyncError> {
        mean_interval(&self.timestamps)
    }
}

/// Sub-sample peak location inside the refined correlation curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakRefinement {
    /// Index of the segment that holds the maximum
    pub index: usize,
    /// Whether the index was moved back one segment
    pub boundary_corrected: bool,
    /// Position of the maximum inside the segment, in samples
    pub fractional_offset: f64,
}

/// Two-stream gyro time delay estimator
///
/// Single-use: `estimate_delay` calibrates the first stream in place, so a
/// second call starts from already calibrated data.
#[derive(Debug, Clone)]
pub struct TimeSync {
    first: Track,
    second: Track,
    config: EstimatorConfig,
    sample_interval: Option<f64>,
    calibration: Option<Matrix3<f64>>,
    estimate: Option<DelayEstimate>,
}

impl TimeSync {
    /// Estimator with default accuracy and root policy
    pub fn new(first: GyroStream, second: GyroStream, do_resample: bool) -> Self {
        Self::with_config(
            first,
            second,
            EstimatorConfig {
                resample: do_resample,
                ..EstimatorConfig::default()
            },
        )
    }

    pub fn with_config(first: GyroStream, second: GyroStream, config: EstimatorConfig) -> Self {
        Self {
            first: Track::from_stream(first),
            second: Track::from_stream(second),
            config,
            sample_interval: None,
            calibration: None,
            estimate: None,
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Working sample interval, known once [`resample`](Self::resample) ran
    pub fn sample_interval(&self) -> Option<f64> {
        self.sample_interval
    }

    /// Calibration matrix of the last run (`second ≈ M · first`)
    pub fn calibration(&self) -> Option<&Matrix3<f64>> {
        self.calibration.as_ref()
    }

    /// Delay of the last run in seconds
    pub fn delay(&self) -> Option<f64> {
        self.estimate.map(|e| e.delay_s)
    }

    /// Full report of the last run
    pub fn estimate(&self) -> Option<&DelayEstimate> {
        self.estimate.as_ref()
    }

    /// Fix the working interval and, if enabled, move both streams onto a
    /// uniform grid with that spacing
    #[instrument(name = "time_sync_resample", skip(self), fields(resample = self.config.resample))]
    pub fn resample(&mut self, accuracy: f64) -> Result<f64, SyncError> {
        if !accuracy.is_finite() || accuracy <= 0.0 {
            return Err(SyncError::invalid_input(
                "accuracy",
                format!("must be positive and finite, got {accuracy}"),
            ));
        }

        let dt = accuracy
            .min(self.first.mean_interval()?)
            .min(self.second.mean_interval()?);

        if self.config.resample {
            let max_rows = self.config.max_grid_len;
            self.first = resample_track(&self.first, dt, max_rows)?;
            self.second = resample_track(&self.second, dt, max_rows)?;
        }

        tracing::debug!(
            dt,
            first_len = self.first.len(),
            second_len = self.second.len(),
            "streams resampled"
        );
        metrics::histogram!("gyro_sync_sample_interval_ms").record(dt * 1e3);

        self.sample_interval = Some(dt);
        Ok(dt)
    }

    /// Run the full pipeline and return the delay in seconds
    ///
    /// Resamples with the configured accuracy first if
    /// [`resample`](Self::resample) was never called.
    #[instrument(
        name = "time_sync_estimate_delay",
        skip(self),
        fields(first_len = self.first.len(), second_len = self.second.len())
    )]
    pub fn estimate_delay(&mut self) -> Result<DelayEstimate, SyncError> {
        match self.run() {
            Ok(estimate) => {
                metrics::counter!("gyro_sync_estimations_total", "status" => "ok").increment(1);
                metrics::histogram!("gyro_sync_delay_ms").record(estimate.delay_s * 1e3);
                if estimate.boundary_corrected {
                    metrics::counter!("gyro_sync_boundary_corrections_total").increment(1);
                }
                tracing::info!(
                    delay_s = estimate.delay_s,
                    coarse_lag = estimate.coarse_lag,
                    "delay estimated"
                );
                Ok(estimate)
            }
            Err(err) => {
                metrics::counter!("gyro_sync_estimations_total", "status" => err.kind())
                    .increment(1);
                Err(err)
            }
        }
    }

    fn run(&mut self) -> Result<DelayEstimate, SyncError> {
        let dt = match self.sample_interval {
            Some(dt) => dt,
            None => self.resample(self.config.accuracy)?,
        };

        let first_len = self.first.len();
        let shift = -(first_len as i64 - 1);

        let coarse = self.correlate()?;
        let coarse_lag = signed_lag(coarse.peak_index, first_len);
        tracing::debug!(coarse_lag, peak_index = coarse.peak_index, "initial correlation");

        let m = self.calibrate(coarse_lag)?;
        self.first.samples = apply_calibration(&m, &self.first.samples);
        self.calibration = Some(m);

        let refined = self.correlate()?;
        let segments = fit_correlation_spline(&refined)?;
        let peak = refine_peak(&segments, refined.peak_index, self.config.complex_roots)?;

        let delay_s = ((peak.index as i64 + shift) as f64 + peak.fractional_offset) * dt;

        let estimate = DelayEstimate {
            delay_s,
            sample_interval_s: dt,
            coarse_lag,
            peak_index: peak.index,
            boundary_corrected: peak.boundary_corrected,
            fractional_offset: peak.fractional_offset,
            calibration: m.transpose().into(),
        };
        self.estimate = Some(estimate);
        Ok(estimate)
    }

    #[instrument(name = "time_sync_correlate", level = "trace", skip(self))]
    fn correlate(&self) -> Result<CorrelationCurve, SyncError> {
        let first = row_norms(&self.first.samples);
        let second = row_norms(&self.second.samples);
        CorrelationCurve::between(&first, &second)
    }

    #[instrument(name = "time_sync_calibrate", skip(self))]
    fn calibrate(&self, lag: i64) -> Result<Matrix3<f64>, SyncError> {
        let (x1, x2) = align_overlap(&self.first.samples, &self.second.samples, lag)?;
        let m = solve_calibration(&x1, &x2)?;
        tracing::debug!(rows = x1.nrows(), determinant = m.determinant(), "calibration solved");
        Ok(m)
    }
}

/// Interpolate every axis of a track onto `[t0, t_last + dt)` with step `dt`
///
/// The grid length follows the time span, not the sample count, so it is
/// checked against `max_rows` before anything is allocated.
#[instrument(name = "time_sync_interpolate", level = "trace", skip(track))]
fn resample_track(track: &Track, dt: f64, max_rows: usize) -> Result<Track, SyncError> {
    let start = track.timestamps[0];
    let stop = track.timestamps[track.timestamps.len() - 1] + dt;

    let rows = range_len(start, stop, dt)?;
    if rows > max_rows {
        return Err(SyncError::invalid_input(
            "timestamps",
            format!(
                "resampling {:.3} s at dt = {dt} needs {rows} rows, limit is {max_rows}",
                stop - start
            ),
        ));
    }
    let grid = range(start, stop, dt)?;

    let samples = interpolate_gyro(&track.timestamps, &track.samples, grid.as_slice())?;
    Ok(Track {
        timestamps: grid.as_slice().to_vec(),
        samples,
    })
}

/// Spline-interpolate the three axes independently
pub fn interpolate_gyro(
    ts_old: &[f64],
    samples: &GyroMatrix,
    ts_new: &[f64],
) -> Result<GyroMatrix, SyncError> {
    let mut resampled = GyroMatrix::zeros(ts_new.len());
    for axis in 0..3 {
        let column: Vec<f64> = samples.column(axis).iter().copied().collect();
        let values = interpolate(ts_old, &column, ts_new)?;
        for (row, v) in values.into_iter().enumerate() {
            resampled[(row, axis)] = v;
        }
    }
    Ok(resampled)
}

/// Natural spline over the correlation curve against its integer index
#[instrument(name = "time_sync_fit_spline", level = "debug", skip(curve), fields(len = curve.len()))]
fn fit_correlation_spline(curve: &CorrelationCurve) -> Result<Vec<SegmentCoefficients>, SyncError> {
    let knots = range(0.0, curve.len() as f64, 1.0)?;
    let spline = CubicSpline::new(knots.as_slice(), curve.values.as_slice())?;
    Ok(spline.segment_coefficients())
}

/// Locate the maximum of the correlation spline near `peak_index`
///
/// A negative slope at the start of the peak segment means the maximum lies
/// in the previous segment; the index is moved back once.
#[instrument(name = "time_sync_refine_peak", level = "debug", skip(segments))]
pub fn refine_peak(
    segments: &[SegmentCoefficients],
    peak_index: usize,
    policy: ComplexRootPolicy,
) -> Result<PeakRefinement, SyncError> {
    let knots = segments.len() + 1;
    let boundary = |index: i64| SyncError::PeakAtBoundary { index, len: knots };

    let mut index = peak_index;
    let mut segment = *segments
        .get(index)
        .ok_or_else(|| boundary(index as i64))?;

    let mut boundary_corrected = false;
    if segment.b < 0.0 {
        index = index.checked_sub(1).ok_or_else(|| boundary(-1))?;
        segment = segments[index];
        boundary_corrected = true;
        tracing::warn!(peak_index, corrected = index, "peak moved to previous segment");
    }

    let fractional_offset = choose_root(&segment, policy)?;
    tracing::debug!(index, fractional_offset, "peak refined");

    Ok(PeakRefinement {
        index,
        boundary_corrected,
        fractional_offset,
    })
}

/// Stationary point of a segment's cubic picked as the maximum
///
/// Solves `3d·t² + 2c·t + b = 0` and evaluates that derivative at the midpoint
/// of both roots: negative selects the smaller root, otherwise the larger.
pub fn choose_root(segment: &SegmentCoefficients, policy: ComplexRootPolicy) -> Result<f64, SyncError> {
    let coeffs = segment.as_array();
    let order = segment.order();

    let roots = solve_quadratic(3.0 * segment.d, 2.0 * segment.c, segment.b)?;
    let [r0, r1] = real_roots(roots, policy)?;

    let midpoint = (r0 + r1) / 2.0;
    let check: f64 = (0..order)
        .map(|i| (order - i) as f64 * coeffs[i] * midpoint.powi((order - i - 1) as i32))
        .sum();

    Ok(if check < 0.0 { r0.min(r1) } else { r0.max(r1) })
}

fn real_roots(roots: [Complex64; 2], policy: ComplexRootPolicy) -> Result<[f64; 2], SyncError> {
    let imaginary = roots[0].im.abs().max(roots[1].im.abs());
    if imaginary == 0.0 {
        return Ok([roots[0].re, roots[1].re]);
    }

    match policy {
        ComplexRootPolicy::RealPart => {
            tracing::warn!(re = roots[0].re, im = imaginary, "complex roots, using real part");
            Ok([roots[0].re, roots[1].re])
        }
        ComplexRootPolicy::Reject => Err(SyncError::ComplexRoots {
            re: roots[0].re,
            im: imaginary,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ingestion::mock::{MockGyroConfig, MockGyroSource};
    use nalgebra::{Rotation3, Vector3};

    fn stream(config: MockGyroConfig) -> GyroStream {
        MockGyroSource::new(config).generate().unwrap()
    }

    fn pair(delay_s: f64) -> (GyroStream, GyroStream) {
        let first = stream(MockGyroConfig::default());
        let second = stream(MockGyroConfig {
            delay_s,
            ..MockGyroConfig::default()
        });
        (first, second)
    }

    fn segment(d: f64, c: f64, b: f64) -> SegmentCoefficients {
        SegmentCoefficients { d, c, b, a: 0.0 }
    }

    #[test]
    fn test_recovers_known_positive_shift() {
        let delay = 0.1237;
        let (first, second) = pair(delay);
        let mut sync = TimeSync::new(first, second, true);
        let estimate = sync.estimate_delay().unwrap();

        let dt = estimate.sample_interval_s;
        assert!(
            (estimate.delay_s - delay).abs() < dt / 10.0,
            "expected {delay}, got {} (dt = {dt})",
            estimate.delay_s
        );
        assert_eq!(sync.delay(), Some(estimate.delay_s));
    }

    #[test]
    fn test_recovers_known_negative_shift() {
        let delay = -0.0562;
        let (first, second) = pair(delay);
        let mut sync = TimeSync::new(first, second, true);
        let estimate = sync.estimate_delay().unwrap();

        let dt = estimate.sample_interval_s;
        assert!(estimate.coarse_lag < 0, "coarse lag {}", estimate.coarse_lag);
        assert!(
            (estimate.delay_s - delay).abs() < dt / 10.0,
            "expected {delay}, got {}",
            estimate.delay_s
        );
    }

    #[test]
    fn test_recovers_known_rotation() {
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), 0.6)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), -0.3);
        let r = *rotation.matrix();

        let first = stream(MockGyroConfig::default());
        let second = stream(MockGyroConfig {
            // row-major
            rotation: r.transpose().into(),
            ..MockGyroConfig::default()
        });

        let mut sync = TimeSync::new(first, second, true);
        let estimate = sync.estimate_delay().unwrap();

        let m = sync.calibration().unwrap();
        assert_relative_eq!(*m, r, epsilon = 1e-6);
        assert!(
            estimate.delay_s.abs() < estimate.sample_interval_s / 10.0,
            "delay {}",
            estimate.delay_s
        );
    }

    #[test]
    fn test_no_resample_path_uses_raw_samples() {
        let config = MockGyroConfig {
            rate_hz: 200.0,
            ..MockGyroConfig::default()
        };
        let first = stream(config.clone());
        let second = stream(MockGyroConfig {
            delay_s: 0.05,
            ..config
        });

        let mut sync = TimeSync::new(first, second, false);
        let dt = sync.resample(1e-2).unwrap();
        assert!((dt - 0.005).abs() < 1e-12, "dt {dt}");

        let estimate = sync.estimate_delay().unwrap();
        assert_eq!(estimate.coarse_lag, 10);
        assert!((estimate.delay_s - 0.05).abs() < dt / 10.0, "got {}", estimate.delay_s);
    }

    #[test]
    fn test_dt_is_min_of_accuracy_and_intervals() {
        let (first, second) = pair(0.0);
        let mut sync = TimeSync::new(first, second, false);
        assert_eq!(sync.sample_interval(), None);

        let dt = sync.resample(0.5).unwrap();
        assert!((dt - 0.01).abs() < 1e-12);

        let dt = sync.resample(0.002).unwrap();
        assert_eq!(dt, 0.002);
    }

    #[test]
    fn test_resample_rejects_bad_accuracy() {
        let (first, second) = pair(0.0);
        let mut sync = TimeSync::new(first, second, true);
        assert!(sync.resample(0.0).is_err());
        assert!(sync.resample(f64::NAN).is_err());
    }

    #[test]
    fn test_resample_rejects_oversized_grid() {
        // Four samples, but a 10 000 s gap before the last one
        let samples = vec![[0.1, 0.2, 0.3]; 4];
        let first = GyroStream::new(samples.clone(), vec![0.0, 0.001, 0.002, 10_000.0]).unwrap();
        let second = GyroStream::new(samples, vec![0.0, 0.001, 0.002, 0.003]).unwrap();

        let mut sync = TimeSync::new(first, second, true);
        let err = sync.resample(1e-3).unwrap_err();
        assert!(
            matches!(err, SyncError::InvalidInput { ref field, .. } if field == "timestamps"),
            "got {err:?}"
        );
        assert_eq!(sync.sample_interval(), None);
    }

    #[test]
    fn test_grid_limit_follows_config() {
        let (first, second) = pair(0.0);
        let mut sync = TimeSync::with_config(
            first,
            second,
            EstimatorConfig {
                max_grid_len: 5_000,
                ..EstimatorConfig::default()
            },
        );
        // 10 s at 1 ms is 10 000 rows
        assert!(sync.resample(1e-3).is_err());
        assert_eq!(sync.resample(2.5e-3).unwrap(), 2.5e-3);
    }

    #[test]
    fn test_estimate_resamples_implicitly() {
        let (first, second) = pair(0.02);
        let mut sync = TimeSync::with_config(
            first,
            second,
            EstimatorConfig {
                accuracy: 5e-3,
                ..EstimatorConfig::default()
            },
        );
        let estimate = sync.estimate_delay().unwrap();
        assert_eq!(sync.sample_interval(), Some(5e-3));
        assert_eq!(estimate.sample_interval_s, 5e-3);
    }

    #[test]
    fn test_root_choice_picks_larger_root_for_negative_leading_term() {
        // -t³ + 1.5t²: stationary points 0 (min) and 1 (max)
        let root = choose_root(&segment(-1.0, 1.5, 0.0), ComplexRootPolicy::RealPart).unwrap();
        assert!((root - 1.0).abs() < 1e-12, "got {root}");
    }

    #[test]
    fn test_root_choice_picks_smaller_root_for_positive_leading_term() {
        // t³ - 1.5t² + 0.5t: stationary points (3 ± √3) / 6, max at the smaller
        let root = choose_root(&segment(1.0, -1.5, 0.5), ComplexRootPolicy::RealPart).unwrap();
        let expected = (3.0 - 3.0_f64.sqrt()) / 6.0;
        assert!((root - expected).abs() < 1e-12, "got {root}");
    }

    #[test]
    fn test_complex_root_policy() {
        // 3t² + 2t + 1 has no real roots
        let seg = segment(1.0, 1.0, 1.0);
        let root = choose_root(&seg, ComplexRootPolicy::RealPart).unwrap();
        assert!((root + 1.0 / 3.0).abs() < 1e-12);

        let err = choose_root(&seg, ComplexRootPolicy::Reject).unwrap_err();
        assert!(matches!(err, SyncError::ComplexRoots { .. }));
    }

    #[test]
    fn test_refine_peak_boundary_correction() {
        let segments = vec![segment(-1.0, 1.5, 0.0), segment(-1.0, 0.0, -2.0)];
        let peak = refine_peak(&segments, 1, ComplexRootPolicy::RealPart).unwrap();
        assert_eq!(peak.index, 0);
        assert!(peak.boundary_corrected);
        assert!((peak.fractional_offset - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_refine_peak_rejects_boundaries() {
        let segments = vec![segment(-1.0, 0.0, -2.0), segment(-1.0, 1.5, 0.0)];
        let err = refine_peak(&segments, 0, ComplexRootPolicy::RealPart).unwrap_err();
        assert!(matches!(err, SyncError::PeakAtBoundary { index: -1, .. }));

        let err = refine_peak(&segments, 2, ComplexRootPolicy::RealPart).unwrap_err();
        assert!(matches!(err, SyncError::PeakAtBoundary { index: 2, len: 3 }));
    }

    #[test]
    fn test_degenerate_motion_is_rejected() {
        let n = 200;
        let timestamps: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();
        // Rotation about a single axis leaves X1ᵀX1 singular
        let samples: Vec<[f64; 3]> = timestamps
            .iter()
            .map(|t| [(-(t - 1.0_f64).powi(2) * 4.0).exp(), 0.0, 0.0])
            .collect();
        let first = GyroStream::new(samples.clone(), timestamps.clone()).unwrap();
        let second = GyroStream::new(samples, timestamps).unwrap();

        let mut sync = TimeSync::new(first, second, false);
        let err = sync.estimate_delay().unwrap_err();
        assert!(matches!(err, SyncError::SingularSystem { .. }), "got {err:?}");
        assert_eq!(sync.delay(), None);
    }
}
