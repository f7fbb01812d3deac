//! Natural cubic spline interpolation.
//!
//! Segment `i` covers `[x_i, x_{i+1}]` and is stored as
//! `y_i + b_i·t + c_i·t² + d_i·t³` with `t = x - x_i`. Both end second
//! derivatives are zero, so evaluation outside the knots extrapolates
//! linearly.

use contracts::SyncError;

/// Polynomial coefficients of one spline segment in local coordinates
///
/// Represents `d·t³ + c·t² + b·t + a` for `t ∈ [0, dx]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentCoefficients {
    pub d: f64,
    pub c: f64,
    pub b: f64,
    pub a: f64,
}

impl SegmentCoefficients {
    /// Coefficients from highest to lowest order
    pub fn as_array(&self) -> [f64; 4] {
        [self.d, self.c, self.b, self.a]
    }

    /// Polynomial order
    pub fn order(&self) -> usize {
        3
    }

    pub fn eval(&self, t: f64) -> f64 {
        ((self.d * t + self.c) * t + self.b) * t + self.a
    }

    pub fn derivative(&self, t: f64) -> f64 {
        (3.0 * self.d * t + 2.0 * self.c) * t + self.b
    }
}

/// Natural cubic spline through `(x_i, y_i)`
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// First derivative at every knot (length n)
    b: Vec<f64>,
    /// Half the second derivative at the left end of each segment (length n - 1)
    c: Vec<f64>,
    /// Cubic term of each segment (length n - 1)
    d: Vec<f64>,
}

impl CubicSpline {
    /// Fit a natural spline; knots must be strictly increasing
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, SyncError> {
        if x.len() != y.len() {
            return Err(SyncError::invalid_input(
                "spline",
                format!("{} knots but {} values", x.len(), y.len()),
            ));
        }
        if x.len() < 2 {
            return Err(SyncError::invalid_input(
                "spline",
                format!("need at least 2 knots, got {}", x.len()),
            ));
        }
        if let Some(idx) = x.windows(2).position(|w| !(w[1] > w[0])) {
            return Err(SyncError::invalid_input(
                format!("spline.x[{}]", idx + 1),
                "knots must be strictly increasing",
            ));
        }

        let n = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let second = natural_second_derivatives(&h, y);

        let mut b = Vec::with_capacity(n);
        let mut c = Vec::with_capacity(n - 1);
        let mut d = Vec::with_capacity(n - 1);
        for i in 0..n - 1 {
            b.push((y[i + 1] - y[i]) / h[i] - h[i] * (2.0 * second[i] + second[i + 1]) / 6.0);
            c.push(second[i] / 2.0);
            d.push((second[i + 1] - second[i]) / (6.0 * h[i]));
        }
        let last = n - 2;
        b.push(b[last] + 2.0 * c[last] * h[last] + 3.0 * d[last] * h[last] * h[last]);

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            b,
            c,
            d,
        })
    }

    /// Number of knots
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Interpolated value at `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        let n = self.x.len();
        if x < self.x[0] {
            return self.y[0] + self.b[0] * (x - self.x[0]);
        }
        if x > self.x[n - 1] {
            return self.y[n - 1] + self.b[n - 1] * (x - self.x[n - 1]);
        }

        let i = self.segment_of(x);
        let t = x - self.x[i];
        ((self.d[i] * t + self.c[i]) * t + self.b[i]) * t + self.y[i]
    }

    /// Point-wise [`evaluate`](Self::evaluate) over a batch
    pub fn evaluate_batch(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// First derivative at each knot, with both ends pinned to zero
    pub fn first_derivative_at_knots(&self) -> Vec<f64> {
        let mut derivative = self.b.clone();
        let n = derivative.len();
        derivative[0] = 0.0;
        derivative[n - 1] = 0.0;
        derivative
    }

    /// Cubic coefficients of every segment, rebuilt from knot values and
    /// knot derivatives (Hermite form)
    ///
    /// Assumes uniformly spaced knots: `dx` is taken from the first interval.
    pub fn segment_coefficients(&self) -> Vec<SegmentCoefficients> {
        let a = &self.y;
        let b = self.first_derivative_at_knots();
        let dx = self.x[1] - self.x[0];

        (0..a.len() - 1)
            .map(|i| {
                let c = -(2.0 * b[i] + b[i + 1]) / dx + 3.0 * (a[i + 1] - a[i]) / (dx * dx);
                let d = -2.0 * c / (3.0 * dx) + (b[i + 1] - b[i]) / (3.0 * dx * dx);
                SegmentCoefficients {
                    d,
                    c,
                    b: b[i],
                    a: a[i],
                }
            })
            .collect()
    }

    fn segment_of(&self, x: f64) -> usize {
        let upper = self.x.partition_point(|&k| k <= x);
        upper.saturating_sub(1).min(self.x.len() - 2)
    }
}

/// Resample `y_old(x_old)` at `x_new` through a natural cubic spline
pub fn interpolate(x_old: &[f64], y_old: &[f64], x_new: &[f64]) -> Result<Vec<f64>, SyncError> {
    Ok(CubicSpline::new(x_old, y_old)?.evaluate_batch(x_new))
}

/// Second derivatives at every knot with zero curvature at both ends
fn natural_second_derivatives(h: &[f64], y: &[f64]) -> Vec<f64> {
    let n = y.len();
    let mut second = vec![0.0; n];
    if n < 3 {
        return second;
    }

    let interior = n - 2;
    let mut sub = Vec::with_capacity(interior);
    let mut diag = Vec::with_capacity(interior);
    let mut sup = Vec::with_capacity(interior);
    let mut rhs = Vec::with_capacity(interior);
    for i in 1..n - 1 {
        sub.push(h[i - 1]);
        diag.push(2.0 * (h[i - 1] + h[i]));
        sup.push(h[i]);
        rhs.push(6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]));
    }

    let solution = solve_tridiagonal(&sub, &diag, &sup, &rhs);
    second[1..n - 1].copy_from_slice(&solution);
    second
}

/// Thomas algorithm; the system is diagonally dominant so no pivoting is needed
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Vec<f64> {
    let n = diag.len();
    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    c_prime[0] = sup[0] / diag[0];
    d_prime[0] = rhs[0] / diag[0];
    for i in 1..n {
        let denom = diag[i] - sub[i] * c_prime[i - 1];
        c_prime[i] = sup[i] / denom;
        d_prime[i] = (rhs[i] - sub[i] * d_prime[i - 1]) / denom;
    }

    let mut x = vec![0.0; n];
    x[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d_prime[i] - c_prime[i] * x[i + 1];
    }
    x
}
