//! Flat continuously-compounded curve.

use bgm_core::{CurveLabel, Date, Tenor};

use crate::error::{CurveError, CurveResult};
use crate::estimator::CurveForwardEstimator;
use crate::traits::{ForwardRateEstimator, RateCurve};

/// A curve with a constant continuously-compounded rate: `DF(t) = e^{-r t}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatRateCurve {
    reference_date: Date,
    rate: f64,
}

impl FlatRateCurve {
    /// Creates a flat curve.
    #[must_use]
    pub fn new(reference_date: Date, rate: f64) -> Self {
        Self {
            reference_date,
            rate,
        }
    }

    /// The continuously-compounded rate.
    #[must_use]
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl RateCurve for FlatRateCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn discount_factor(&self, t: f64) -> CurveResult<f64> {
        CurveError::ensure_finite("discount factor", (-self.rate * t).exp())
    }

    fn instantaneous_forward(&self, t: f64) -> CurveResult<f64> {
        CurveError::ensure_finite("curve time", t)?;
        Ok(self.rate)
    }

    fn forward_rate_estimator(
        &self,
        tenor: Tenor,
        label: &CurveLabel,
    ) -> CurveResult<Box<dyn ForwardRateEstimator + '_>> {
        Ok(Box::new(CurveForwardEstimator::new(self, tenor, label.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn curve() -> FlatRateCurve {
        FlatRateCurve::new(Date::from_ymd(2025, 1, 1).unwrap(), 0.05)
    }

    #[test]
    fn test_discount_factor() {
        assert_relative_eq!(curve().discount_factor(1.0).unwrap(), (-0.05_f64).exp());
        assert_relative_eq!(curve().discount_factor(0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_forward_rates() {
        let c = curve();
        let expected = (0.05_f64).exp() - 1.0;
        assert_relative_eq!(c.forward_rate(1.0, 2.0).unwrap(), expected, epsilon = 1e-14);
        assert!(c.forward_rate(2.0, 1.0).is_err());
        assert!(c.forward_rate(1.0, 1.0).is_err());
        assert_relative_eq!(c.instantaneous_forward(3.0).unwrap(), 0.05);
    }

    #[test]
    fn test_date_conveniences() {
        let c = curve();
        let one_year = Date::from_ymd(2026, 1, 1).unwrap();
        assert_relative_eq!(c.year_fraction(one_year), 1.0);
        assert_relative_eq!(c.df(one_year).unwrap(), (-0.05_f64).exp(), epsilon = 1e-14);
        let six_months = Date::from_ymd(2025, 7, 2).unwrap();
        assert_relative_eq!(
            c.df_between(six_months, one_year).unwrap(),
            (-0.05_f64 * 183.0 / 365.0).exp(),
            epsilon = 1e-14
        );
    }
}
