//! Spline-fit service.
//!
//! A [`SplineFitRequest`] names the quantity being fitted, carries the knots
//! and the fit controls; [`SplineFitter::fit`] turns it into a
//! [`FittedSpline`]. Every fitted spline is stored in Hermite form (knot
//! values plus knot slopes), whichever way the slopes were obtained:
//!
//! - `calibrate = true`: global C2 cubic spline through every knot, slopes
//!   taken from the tridiagonal second-derivative solve
//! - `calibrate = false`: local C1 spline, each knot slope a weighted average
//!   of the neighbouring secants
//!
//! Segments flagged [`SegmentBasis::Linear`] are evaluated as chords.
//! Outside the knots the spline continues linearly with its end slope.

mod fitter;

pub use fitter::SplineFitter;

use serde::{Deserialize, Serialize};

use crate::error::{MathError, MathResult};
use crate::interpolation::{find_segment, Interpolator};

/// Shape of one spline segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SegmentBasis {
    /// Cubic Hermite segment.
    #[default]
    Cubic,
    /// Straight chord between the two knots.
    Linear,
}

/// End conditions of the fit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum BoundaryCondition {
    /// Zero second derivative at both ends.
    #[default]
    Natural,
    /// Prescribed first derivatives at both ends.
    Clamped {
        /// Slope at the first knot.
        start_slope: f64,
        /// Slope at the last knot.
        end_slope: f64,
    },
    /// Zero second derivative at the first knot, zero slope at the last, so the
    /// long end of a fitted rate curve flattens out.
    Financial,
}

/// Input of [`SplineFitter::fit`].
#[derive(Debug, Clone, PartialEq)]
pub struct SplineFitRequest {
    /// Name of the fitted quantity, used in diagnostics and errors.
    pub name: String,
    /// Knot abscissae, strictly increasing.
    pub xs: Vec<f64>,
    /// Knot values.
    pub values: Vec<f64>,
    /// Per-segment basis; empty means every segment is cubic.
    pub segments: Vec<SegmentBasis>,
    /// Optional positive per-knot weights, used by local fits.
    pub weights: Option<Vec<f64>>,
    /// End conditions.
    pub boundary: BoundaryCondition,
    /// Global C2 solve (`true`) or local C1 fit (`false`).
    pub calibrate: bool,
}

impl SplineFitRequest {
    /// Creates a calibrated, natural, all-cubic request.
    #[must_use]
    pub fn new(name: impl Into<String>, xs: Vec<f64>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            xs,
            values,
            segments: Vec::new(),
            weights: None,
            boundary: BoundaryCondition::Natural,
            calibrate: true,
        }
    }

    /// Uses `basis` for every segment.
    #[must_use]
    pub fn with_basis(mut self, basis: SegmentBasis) -> Self {
        self.segments = vec![basis; self.xs.len().saturating_sub(1)];
        self
    }

    /// Sets the per-segment basis explicitly.
    #[must_use]
    pub fn with_segments(mut self, segments: Vec<SegmentBasis>) -> Self {
        self.segments = segments;
        self
    }

    /// Sets knot weights.
    #[must_use]
    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        self.weights = Some(weights);
        self
    }

    /// Sets the boundary condition.
    #[must_use]
    pub fn with_boundary(mut self, boundary: BoundaryCondition) -> Self {
        self.boundary = boundary;
        self
    }

    /// Chooses between the global and the local fit.
    #[must_use]
    pub fn with_calibration(mut self, calibrate: bool) -> Self {
        self.calibrate = calibrate;
        self
    }
}

/// A fitted spline in Hermite form.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedSpline {
    name: String,
    xs: Vec<f64>,
    ys: Vec<f64>,
    slopes: Vec<f64>,
    bases: Vec<SegmentBasis>,
}

impl FittedSpline {
    /// Name of the fitted quantity.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Knot abscissae.
    #[must_use]
    pub fn knots(&self) -> &[f64] {
        &self.xs
    }

    /// Knot values.
    #[must_use]
    pub fn knot_values(&self) -> &[f64] {
        &self.ys
    }

    /// Value at `x`.
    #[must_use]
    pub fn value(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if n == 1 {
            return self.ys[0];
        }
        if x < self.xs[0] {
            return self.ys[0] + (x - self.xs[0]) * self.start_slope();
        }
        if x > self.xs[n - 1] {
            return self.ys[n - 1] + (x - self.xs[n - 1]) * self.end_slope();
        }

        let i = find_segment(&self.xs, x);
        let (x0, x1, y0, y1) = (self.xs[i], self.xs[i + 1], self.ys[i], self.ys[i + 1]);
        let h = x1 - x0;
        let t = (x - x0) / h;
        match self.bases[i] {
            SegmentBasis::Linear => y0 + t * (y1 - y0),
            SegmentBasis::Cubic => {
                let (m0, m1) = (self.slopes[i], self.slopes[i + 1]);
                let t2 = t * t;
                let t3 = t2 * t;
                (2.0 * t3 - 3.0 * t2 + 1.0) * y0
                    + (t3 - 2.0 * t2 + t) * h * m0
                    + (-2.0 * t3 + 3.0 * t2) * y1
                    + (t3 - t2) * h * m1
            }
        }
    }

    /// First derivative at `x`.
    #[must_use]
    pub fn slope(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if n == 1 {
            return 0.0;
        }
        if x < self.xs[0] {
            return self.start_slope();
        }
        if x > self.xs[n - 1] {
            return self.end_slope();
        }

        let i = find_segment(&self.xs, x);
        self.segment_slope(i, x)
    }

    fn segment_slope(&self, i: usize, x: f64) -> f64 {
        let (x0, x1, y0, y1) = (self.xs[i], self.xs[i + 1], self.ys[i], self.ys[i + 1]);
        let h = x1 - x0;
        match self.bases[i] {
            SegmentBasis::Linear => (y1 - y0) / h,
            SegmentBasis::Cubic => {
                let t = (x - x0) / h;
                let t2 = t * t;
                let (m0, m1) = (self.slopes[i], self.slopes[i + 1]);
                (6.0 * t2 - 6.0 * t) * (y0 - y1) / h
                    + (3.0 * t2 - 4.0 * t + 1.0) * m0
                    + (3.0 * t2 - 2.0 * t) * m1
            }
        }
    }

    fn start_slope(&self) -> f64 {
        self.segment_slope(0, self.xs[0])
    }

    fn end_slope(&self) -> f64 {
        let n = self.xs.len();
        self.segment_slope(n - 2, self.xs[n - 1])
    }
}

impl Interpolator for FittedSpline {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        MathError::ensure_finite("spline abscissa", x)?;
        MathError::ensure_finite("spline value", self.value(x))
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        MathError::ensure_finite("spline abscissa", x)?;
        MathError::ensure_finite("spline slope", self.slope(x))
    }

    fn min_x(&self) -> f64 {
        self.xs[0]
    }

    fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }
}
