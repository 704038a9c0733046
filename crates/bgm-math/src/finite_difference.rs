//! Finite-difference differentiation of scalar closures.
//!
//! Curve quantities are differentiated in their time argument by wrapping
//! them as `Fn(f64) -> Result<f64, E>` closures. The error type is left
//! generic so callers keep their own error enum as long as it can absorb a
//! [`MathError`].
//!
//! ```rust
//! use bgm_math::finite_difference::{derivative, DifferenceScheme};
//! use bgm_math::MathError;
//!
//! let f = |x: f64| -> Result<f64, MathError> { Ok(x.exp()) };
//! let d = derivative(f, 0.0, 1e-5, DifferenceScheme::Central).unwrap();
//! assert!((d - 1.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{MathError, MathResult};

/// Default step, in the units of the closure's argument.
pub const DEFAULT_STEP: f64 = 1e-4;

/// Difference scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DifferenceScheme {
    /// `(f(x+h) - f(x-h)) / 2h`.
    #[default]
    Central,
    /// `(f(x+h) - f(x)) / h`.
    Forward,
    /// `(f(x) - f(x-h)) / h`.
    Backward,
    /// Central differences at `h` and `h/2` combined to cancel the `h²` error term.
    Richardson,
}

/// Scheme and step bundled together, as carried by evolver configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiniteDifference {
    /// Difference scheme.
    pub scheme: DifferenceScheme,
    /// Step size.
    pub step: f64,
}

impl Default for FiniteDifference {
    fn default() -> Self {
        Self {
            scheme: DifferenceScheme::Central,
            step: DEFAULT_STEP,
        }
    }
}

impl FiniteDifference {
    /// Creates a differentiator.
    #[must_use]
    pub fn new(scheme: DifferenceScheme, step: f64) -> Self {
        Self { scheme, step }
    }

    /// Sets the scheme.
    #[must_use]
    pub fn with_scheme(mut self, scheme: DifferenceScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the step.
    #[must_use]
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Derivative of `f` at `x`.
    pub fn derivative<F, E>(&self, f: F, x: f64) -> Result<f64, E>
    where
        F: Fn(f64) -> Result<f64, E>,
        E: From<MathError>,
    {
        derivative(f, x, self.step, self.scheme)
    }
}

/// Derivative of `f` at `x` with step `step`.
///
/// # Errors
///
/// Fails when `x` is not finite, when `step` is not a positive finite
/// number, when `f` fails, or when the estimate is not finite.
pub fn derivative<F, E>(f: F, x: f64, step: f64, scheme: DifferenceScheme) -> Result<f64, E>
where
    F: Fn(f64) -> Result<f64, E>,
    E: From<MathError>,
{
    validate(x, step)?;

    let estimate = match scheme {
        DifferenceScheme::Central => central(&f, x, step)?,
        DifferenceScheme::Forward => (f(x + step)? - f(x)?) / step,
        DifferenceScheme::Backward => (f(x)? - f(x - step)?) / step,
        DifferenceScheme::Richardson => {
            let coarse = central(&f, x, step)?;
            let fine = central(&f, x, 0.5 * step)?;
            (4.0 * fine - coarse) / 3.0
        }
    };

    Ok(MathError::ensure_finite("finite-difference derivative", estimate)?)
}

/// Divided difference `(f(b) - f(a)) / (b - a)`.
///
/// # Errors
///
/// Fails when `a == b`, when either abscissa is not finite, or when `f` fails.
pub fn divided_difference<F, E>(f: F, a: f64, b: f64) -> Result<f64, E>
where
    F: Fn(f64) -> Result<f64, E>,
    E: From<MathError>,
{
    MathError::ensure_finite("divided difference abscissa", a)?;
    MathError::ensure_finite("divided difference abscissa", b)?;
    let width = b - a;
    if width == 0.0 {
        return Err(MathError::DivisionByZero { value: width }.into());
    }
    let slope = (f(b)? - f(a)?) / width;
    Ok(MathError::ensure_finite("divided difference", slope)?)
}

fn central<F, E>(f: &F, x: f64, h: f64) -> Result<f64, E>
where
    F: Fn(f64) -> Result<f64, E>,
{
    Ok((f(x + h)? - f(x - h)?) / (2.0 * h))
}

fn validate(x: f64, step: f64) -> MathResult<()> {
    MathError::ensure_finite("differentiation point", x)?;
    if !(step.is_finite() && step > 0.0) {
        return Err(MathError::invalid_input(format!(
            "finite-difference step must be positive and finite, got {step}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cubic(x: f64) -> MathResult<f64> {
        Ok(x * x * x - 2.0 * x)
    }

    #[test]
    fn test_schemes_on_cubic() {
        // f'(1.5) = 3 * 2.25 - 2 = 4.75
        for scheme in [DifferenceScheme::Central, DifferenceScheme::Richardson] {
            let d = derivative(cubic, 1.5, 1e-4, scheme).unwrap();
            assert_relative_eq!(d, 4.75, epsilon = 1e-7);
        }
        for scheme in [DifferenceScheme::Forward, DifferenceScheme::Backward] {
            let d = derivative(cubic, 1.5, 1e-6, scheme).unwrap();
            assert_relative_eq!(d, 4.75, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_richardson_beats_central_at_coarse_step() {
        let f = |x: f64| -> MathResult<f64> { Ok(x.sin()) };
        let exact = 0.7_f64.cos();
        let central = derivative(f, 0.7, 0.1, DifferenceScheme::Central).unwrap();
        let richardson = derivative(f, 0.7, 0.1, DifferenceScheme::Richardson).unwrap();
        assert!((richardson - exact).abs() < (central - exact).abs());
    }

    #[test]
    fn test_linear_function_is_exact() {
        let f = |x: f64| -> MathResult<f64> { Ok(0.03 + 0.002 * x) };
        let d = FiniteDifference::default().derivative(f, 2.0).unwrap();
        assert_relative_eq!(d, 0.002, epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_step_rejected() {
        assert!(derivative(cubic, 1.0, 0.0, DifferenceScheme::Central).is_err());
        assert!(derivative(cubic, 1.0, -1e-4, DifferenceScheme::Central).is_err());
        assert!(derivative(cubic, f64::NAN, 1e-4, DifferenceScheme::Central).is_err());
    }

    #[test]
    fn test_closure_error_propagates() {
        let failing = |_: f64| -> MathResult<f64> { Err(MathError::invalid_input("boom")) };
        let err = derivative(failing, 1.0, 1e-4, DifferenceScheme::Forward).unwrap_err();
        assert_eq!(err, MathError::invalid_input("boom"));
    }

    #[test]
    fn test_non_finite_result_rejected() {
        let f = |x: f64| -> MathResult<f64> { Ok(if x > 1.0 { f64::INFINITY } else { 0.0 }) };
        assert!(matches!(
            derivative(f, 1.0, 1e-3, DifferenceScheme::Central),
            Err(MathError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_divided_difference() {
        let d = divided_difference(cubic, 0.0, 2.0).unwrap();
        assert_relative_eq!(d, (4.0 - 0.0) / 2.0);
        assert!(divided_difference(cubic, 1.0, 1.0).is_err());
    }
}
