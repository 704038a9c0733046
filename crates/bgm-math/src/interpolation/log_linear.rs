//! Log-linear interpolation.

use super::{find_segment, validate_knots, Interpolator};
use crate::error::{MathError, MathResult};

/// Log-linear interpolation between positive values.
///
/// Linear in `ln y`, so discount factors interpolated this way carry a
/// piecewise-constant continuously-compounded forward rate. Outside the knot
/// range the end segments are continued, which keeps that forward rate flat.
///
/// ```rust
/// use bgm_math::interpolation::{Interpolator, LogLinearInterpolator};
///
/// let interp = LogLinearInterpolator::new(vec![0.0, 1.0, 2.0], vec![1.0, 0.97, 0.94]).unwrap();
/// assert!(interp.interpolate(1.5).unwrap() > 0.94);
/// assert!(interp.interpolate(5.0).unwrap() > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct LogLinearInterpolator {
    xs: Vec<f64>,
    log_ys: Vec<f64>,
}

impl LogLinearInterpolator {
    /// Creates a log-linear interpolator from at least two positive values.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        validate_knots(&xs, &ys, 2)?;

        let mut log_ys = Vec::with_capacity(ys.len());
        for (i, &y) in ys.iter().enumerate() {
            if y <= 0.0 {
                return Err(MathError::invalid_input(format!(
                    "y[{i}] = {y} is not positive; log-linear requires positive values"
                )));
            }
            log_ys.push(y.ln());
        }

        Ok(Self { xs, log_ys })
    }

    /// Slope of `ln y` on the segment containing `x`.
    fn log_slope(&self, i: usize) -> f64 {
        (self.log_ys[i + 1] - self.log_ys[i]) / (self.xs[i + 1] - self.xs[i])
    }

    fn log_value(&self, x: f64) -> f64 {
        let i = find_segment(&self.xs, x);
        self.log_ys[i] + (x - self.xs[i]) * self.log_slope(i)
    }
}

impl Interpolator for LogLinearInterpolator {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        MathError::ensure_finite("log-linear abscissa", x)?;
        Ok(self.log_value(x).exp())
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        MathError::ensure_finite("log-linear abscissa", x)?;
        let i = find_segment(&self.xs, x);
        Ok(self.log_value(x).exp() * self.log_slope(i))
    }

    fn min_x(&self) -> f64 {
        self.xs[0]
    }

    fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }
}
