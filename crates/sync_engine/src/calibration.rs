//! Least-squares axis calibration between two gyro frames.

use contracts::SyncError;
use nalgebra::Matrix3;

use crate::numeric::GyroMatrix;

/// Minimum aligned rows for a determined 3×3 system
pub const MIN_CALIBRATION_ROWS: usize = 3;

/// Relative determinant floor below which `X1ᵀX1` counts as singular
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Trim both streams to their overlapping rows for a signed lag
///
/// A positive lag means `second[m + lag]` lines up with `first[m]`, so the
/// leading `lag` rows of `second` are dropped; a negative lag drops the
/// leading rows of `first` instead. Both results have the same row count.
pub fn align_overlap(
    first: &GyroMatrix,
    second: &GyroMatrix,
    lag: i64,
) -> Result<(GyroMatrix, GyroMatrix), SyncError> {
    let offset = lag.unsigned_abs() as usize;
    let (start_first, start_second) = if lag >= 0 { (0, offset) } else { (offset, 0) };

    let rows = first
        .nrows()
        .saturating_sub(start_first)
        .min(second.nrows().saturating_sub(start_second));
    if rows < MIN_CALIBRATION_ROWS {
        return Err(SyncError::InsufficientOverlap { rows });
    }

    Ok((
        first.rows(start_first, rows).into_owned(),
        second.rows(start_second, rows).into_owned(),
    ))
}

/// Ordinary least-squares `M` with `second_row ≈ M · first_row`
///
/// Solves `W = (X1ᵀX1)⁻¹ X1ᵀX2` and returns `M = Wᵀ`.
pub fn solve_calibration(x1: &GyroMatrix, x2: &GyroMatrix) -> Result<Matrix3<f64>, SyncError> {
    if x1.nrows() != x2.nrows() {
        return Err(SyncError::invalid_input(
            "calibration",
            format!("row count mismatch: {} vs {}", x1.nrows(), x2.nrows()),
        ));
    }
    if x1.nrows() < MIN_CALIBRATION_ROWS {
        return Err(SyncError::InsufficientOverlap { rows: x1.nrows() });
    }

    let normal: Matrix3<f64> = x1.tr_mul(x1);
    let determinant = normal.determinant();
    let scale = (normal.trace() / 3.0).powi(3);
    if !determinant.is_finite() || determinant.abs() <= SINGULAR_TOLERANCE * scale.abs() {
        return Err(SyncError::SingularSystem { determinant });
    }

    let inverse = normal
        .try_inverse()
        .ok_or(SyncError::SingularSystem { determinant })?;
    let cross: Matrix3<f64> = x1.tr_mul(x2);

    Ok((inverse * cross).transpose())
}

/// Map every row of `samples` through `m`
///
/// Row form of `(M · Xᵀ)ᵀ`.
pub fn apply_calibration(m: &Matrix3<f64>, samples: &GyroMatrix) -> GyroMatrix {
    samples * m.transpose()
}
