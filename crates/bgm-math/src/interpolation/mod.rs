//! Interpolation over strictly increasing knots.
//!
//! - [`LogLinearInterpolator`]: log-linear on positive values (discount factors)
//! - [`FittedSpline`](crate::spline::FittedSpline): output of the spline-fit service
//!
//! Both extrapolate: curve evolution routinely queries a fitted curve a little
//! past its last node (forward rates one tenor beyond the final target).

mod log_linear;

pub use log_linear::LogLinearInterpolator;

use std::cmp::Ordering;

use crate::error::{MathError, MathResult};

/// Trait for interpolation methods.
pub trait Interpolator: Send + Sync {
    /// Returns the interpolated value at x.
    fn interpolate(&self, x: f64) -> MathResult<f64>;

    /// Returns the first derivative at x.
    fn derivative(&self, x: f64) -> MathResult<f64>;

    /// Returns the minimum x value in the data.
    fn min_x(&self) -> f64;

    /// Returns the maximum x value in the data.
    fn max_x(&self) -> f64;

    /// Checks if x is within the knot range.
    fn in_range(&self, x: f64) -> bool {
        x >= self.min_x() && x <= self.max_x()
    }
}

/// Checks knot abscissae and ordinates: equal lengths, at least `min_len`
/// points, all finite, abscissae strictly increasing.
pub(crate) fn validate_knots(xs: &[f64], ys: &[f64], min_len: usize) -> MathResult<()> {
    if xs.len() < min_len {
        return Err(MathError::insufficient_data(min_len, xs.len()));
    }
    if xs.len() != ys.len() {
        return Err(MathError::invalid_input(format!(
            "xs and ys must have same length: {} vs {}",
            xs.len(),
            ys.len()
        )));
    }
    for (i, (&x, &y)) in xs.iter().zip(ys).enumerate() {
        if !x.is_finite() {
            return Err(MathError::non_finite(format!("x[{i}]"), x));
        }
        if !y.is_finite() {
            return Err(MathError::non_finite(format!("y[{i}]"), y));
        }
    }
    if xs.windows(2).any(|w| w[1] <= w[0]) {
        return Err(MathError::invalid_input(
            "x values must be strictly increasing",
        ));
    }
    Ok(())
}

/// Index `i` of the segment `[xs[i], xs[i+1]]` used for `x`; clamps to the
/// first or last segment outside the knot range. Requires `xs.len() >= 2`.
pub(crate) fn find_segment(xs: &[f64], x: f64) -> usize {
    let last = xs.len() - 2;
    match xs.binary_search_by(|knot| knot.partial_cmp(&x).unwrap_or(Ordering::Equal)) {
        Ok(i) => i.min(last),
        Err(i) => i.saturating_sub(1).min(last),
    }
}
