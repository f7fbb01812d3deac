//! Stateless numeric helpers: ranges, differences, FFT cross-correlation and
//! quadratic roots.

use contracts::SyncError;
use nalgebra::{DVector, MatrixXx3};
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

/// N×3 angular velocity matrix, one sample per row
pub type GyroMatrix = MatrixXx3<f64>;

/// Pack `[x, y, z]` samples into an N×3 matrix
pub fn to_matrix(samples: &[[f64; 3]]) -> GyroMatrix {
    GyroMatrix::from_fn(samples.len(), |r, c| samples[r][c])
}

/// Number of values [`range`] yields for `[start, stop)` with `step`
pub fn range_len(start: f64, stop: f64, step: f64) -> Result<usize, SyncError> {
    if !step.is_finite() || step <= 0.0 {
        return Err(SyncError::invalid_input(
            "step",
            format!("range step must be positive and finite, got {step}"),
        ));
    }
    if !start.is_finite() || !stop.is_finite() {
        return Err(SyncError::invalid_input(
            "range",
            format!("range bounds must be finite, got [{start}, {stop})"),
        ));
    }

    Ok(((stop - start) / step).ceil().max(0.0) as usize)
}

/// Half-open arithmetic sequence `[start, stop)` with `ceil((stop - start) / step)` values
///
/// Matches `numpy.arange`. An empty or reversed interval yields an empty vector.
pub fn range(start: f64, stop: f64, step: f64) -> Result<DVector<f64>, SyncError> {
    let count = range_len(start, stop, step)?;
    Ok(DVector::from_fn(count, |i, _| start + i as f64 * step))
}

/// `v[i] - v[i - 1]` for `i = 1..n`, empty when fewer than two values
pub fn adjacent_difference(values: &[f64]) -> DVector<f64> {
    let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
    DVector::from_vec(diffs)
}

/// Mean spacing of a sequence of timestamps
pub fn mean_interval(timestamps: &[f64]) -> Result<f64, SyncError> {
    let diffs = adjacent_difference(timestamps);
    if diffs.is_empty() {
        return Err(SyncError::invalid_input(
            "timestamps",
            "need at least two timestamps to measure an interval",
        ));
    }
    Ok(diffs.mean())
}

/// Euclidean norm of every row
///
/// Collapses a 3-axis signal into a rotation invariant magnitude.
pub fn row_norms(samples: &GyroMatrix) -> DVector<f64> {
    DVector::from_iterator(samples.nrows(), samples.row_iter().map(|row| row.norm()))
}

/// Index of the first maximum
pub fn argmax(values: &DVector<f64>) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_idx, best), (idx, &v)| {
            if v > best {
                (idx, v)
            } else {
                (best_idx, best)
            }
        })
        .0
}

/// Full linear cross-correlation via zero-padded FFT
///
/// Output has the padded length `N = next_pow2(len(a) + len(b) - 1)`. Index
/// `i` holds lag `L = i - (len(a) - 1)`, i.e. `Σ_m a[m] · b[m + L]`, so a
/// peak at positive `L` means `b` is `a` delayed by `L` samples. Indices past
/// `len(a) + len(b) - 2` fall in the zero padding.
pub fn cross_correlate(a: &DVector<f64>, b: &DVector<f64>) -> Result<DVector<f64>, SyncError> {
    let (len_a, len_b) = (a.len(), b.len());
    if len_a == 0 || len_b == 0 {
        return Err(SyncError::invalid_input(
            "signal",
            format!("cannot correlate empty signals ({len_a}, {len_b})"),
        ));
    }

    let n = (len_a + len_b - 1).next_power_of_two();

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let inverse = planner.plan_fft_inverse(n);

    let mut spectrum_a = zero_padded(a, n);
    let mut spectrum_b = zero_padded(b, n);
    forward.process(&mut spectrum_a);
    forward.process(&mut spectrum_b);

    let mut product: Vec<Complex64> = spectrum_a
        .iter()
        .zip(&spectrum_b)
        .map(|(x, y)| x * y.conj())
        .collect();
    inverse.process(&mut product);

    let scale = 1.0 / n as f64;
    let mut correlation: Vec<f64> = product.iter().map(|c| c.re * scale).collect();

    // Circular layout -> linear lag order
    correlation.rotate_left(len_a);
    correlation.reverse();

    Ok(DVector::from_vec(correlation))
}

fn zero_padded(signal: &DVector<f64>, n: usize) -> Vec<Complex64> {
    let mut padded = vec![Complex64::new(0.0, 0.0); n];
    for (slot, &v) in padded.iter_mut().zip(signal.iter()) {
        slot.re = v;
    }
    padded
}

/// Correlation curve together with the index of its dominant peak
#[derive(Debug, Clone)]
pub struct CorrelationCurve {
    pub values: DVector<f64>,
    pub peak_index: usize,
}

impl CorrelationCurve {
    /// Correlate two magnitude signals and locate the peak
    pub fn between(a: &DVector<f64>, b: &DVector<f64>) -> Result<Self, SyncError> {
        let values = cross_correlate(a, b)?;
        let peak_index = argmax(&values);
        Ok(Self { values, peak_index })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Convert a correlation index into a signed lag (samples)
pub fn signed_lag(index: usize, first_len: usize) -> i64 {
    index as i64 - (first_len as i64 - 1)
}

/// Both roots of `c2·x² + c1·x + c0 = 0`
///
/// Non-real roots come back as a conjugate pair. A vanishing `c2` degrades to
/// the linear root, returned twice.
pub fn solve_quadratic(c2: f64, c1: f64, c0: f64) -> Result<[Complex64; 2], SyncError> {
    if c2 == 0.0 {
        if c1 == 0.0 {
            return Err(SyncError::DegenerateQuadratic);
        }
        let root = Complex64::new(-c0 / c1, 0.0);
        return Ok([root, root]);
    }

    let discriminant = c1 * c1 - 4.0 * c2 * c0;
    if discriminant >= 0.0 {
        // Numerically stable form, avoids cancellation in -c1 ± sqrt(disc)
        let q = -0.5 * (c1 + c1.signum() * discriminant.sqrt());
        if q == 0.0 {
            return Ok([Complex64::new(0.0, 0.0); 2]);
        }
        Ok([Complex64::new(q / c2, 0.0), Complex64::new(c0 / q, 0.0)])
    } else {
        let re = -c1 / (2.0 * c2);
        let im = (-discriminant).sqrt() / (2.0 * c2.abs());
        Ok([Complex64::new(re, im), Complex64::new(re, -im)])
    }
}
