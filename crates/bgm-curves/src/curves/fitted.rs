//! Spline-backed curves produced by refits.

use std::sync::Arc;

use bgm_core::{CurveLabel, Date, Tenor};
use bgm_math::spline::FittedSpline;

use crate::error::{CurveError, CurveResult};
use crate::estimator::CurveForwardEstimator;
use crate::traits::{curve_time, ForwardRateEstimator, RateCurve};

/// A fitted quantity on the curve time axis of `reference_date`.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedCurve {
    label: CurveLabel,
    reference_date: Date,
    spline: FittedSpline,
}

impl FittedCurve {
    /// Wraps a fitted spline whose abscissae are years from `reference_date`.
    #[must_use]
    pub fn new(label: CurveLabel, reference_date: Date, spline: FittedSpline) -> Self {
        Self {
            label,
            reference_date,
            spline,
        }
    }

    /// Curve label.
    #[must_use]
    pub fn label(&self) -> &CurveLabel {
        &self.label
    }

    /// Name of the fitted quantity.
    #[must_use]
    pub fn name(&self) -> &str {
        self.spline.name()
    }

    /// Time zero of the curve.
    #[must_use]
    pub fn reference_date(&self) -> Date {
        self.reference_date
    }

    /// The underlying spline.
    #[must_use]
    pub fn spline(&self) -> &FittedSpline {
        &self.spline
    }

    /// Value at time `t`.
    pub fn value(&self, t: f64) -> CurveResult<f64> {
        CurveError::ensure_finite("curve time", t)?;
        CurveError::ensure_finite(self.name(), self.spline.value(t))
    }

    /// Value on `date`.
    pub fn value_at(&self, date: Date) -> CurveResult<f64> {
        self.value(curve_time(self.reference_date, date))
    }

    /// Slope in `t` at time `t`.
    pub fn slope(&self, t: f64) -> CurveResult<f64> {
        CurveError::ensure_finite("curve time", t)?;
        CurveError::ensure_finite(self.name(), self.spline.slope(t))
    }
}

/// Rate curve view over refitted discount-factor, continuous-forward and
/// LIBOR curves sharing one reference date.
///
/// Discount factors are normalised by the fitted value at time zero, so
/// `DF(0) = 1`. Instantaneous forwards come straight from the fitted
/// continuous-forward curve, and estimators for the fitted tenor read the
/// LIBOR fit.
#[derive(Debug, Clone)]
pub struct FittedRateCurve {
    reference_date: Date,
    tenor: Tenor,
    discount: Arc<FittedCurve>,
    continuous_forward: Arc<FittedCurve>,
    libor: Arc<FittedCurve>,
    anchor: f64,
}

impl FittedRateCurve {
    /// Assembles the view.
    ///
    /// # Errors
    ///
    /// Fails when the three curves disagree on their reference date or when
    /// the fitted discount factor at time zero is not positive.
    pub fn new(
        tenor: Tenor,
        discount: Arc<FittedCurve>,
        continuous_forward: Arc<FittedCurve>,
        libor: Arc<FittedCurve>,
    ) -> CurveResult<Self> {
        let reference_date = discount.reference_date();
        for other in [&continuous_forward, &libor] {
            if other.reference_date() != reference_date {
                return Err(CurveError::builder_error(format!(
                    "'{}' starts on {} but '{}' starts on {reference_date}",
                    other.name(),
                    other.reference_date(),
                    discount.name()
                )));
            }
        }
        let anchor = discount.value(0.0)?;
        if anchor <= 0.0 {
            return Err(CurveError::NonPositiveDiscountFactor {
                t: 0.0,
                value: anchor,
            });
        }
        Ok(Self {
            reference_date,
            tenor,
            discount,
            continuous_forward,
            libor,
            anchor,
        })
    }

    /// Tenor of the LIBOR fit.
    #[must_use]
    pub fn tenor(&self) -> Tenor {
        self.tenor
    }

    /// The fitted LIBOR curve.
    #[must_use]
    pub fn libor_curve(&self) -> &Arc<FittedCurve> {
        &self.libor
    }
}

impl RateCurve for FittedRateCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn discount_factor(&self, t: f64) -> CurveResult<f64> {
        let df = self.discount.value(t)? / self.anchor;
        if df <= 0.0 {
            return Err(CurveError::NonPositiveDiscountFactor { t, value: df });
        }
        Ok(df)
    }

    fn instantaneous_forward(&self, t: f64) -> CurveResult<f64> {
        self.continuous_forward.value(t)
    }

    fn forward_rate_estimator(
        &self,
        tenor: Tenor,
        label: &CurveLabel,
    ) -> CurveResult<Box<dyn ForwardRateEstimator + '_>> {
        if tenor == self.tenor {
            Ok(Box::new(FittedLiborEstimator {
                curve: self.libor.as_ref(),
                tenor,
                label: label.clone(),
            }))
        } else {
            Ok(Box::new(CurveForwardEstimator::new(self, tenor, label.clone())))
        }
    }
}

/// Estimator reading fixings directly off a fitted LIBOR curve.
#[derive(Debug)]
struct FittedLiborEstimator<'a> {
    curve: &'a FittedCurve,
    tenor: Tenor,
    label: CurveLabel,
}

impl ForwardRateEstimator for FittedLiborEstimator<'_> {
    fn label(&self) -> &CurveLabel {
        &self.label
    }

    fn tenor(&self) -> Tenor {
        self.tenor
    }

    fn reference_date(&self) -> Date {
        self.curve.reference_date()
    }

    fn forward_rate(&self, t: f64) -> CurveResult<f64> {
        self.curve.value(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bgm_math::spline::{SplineFitRequest, SplineFitter};

    fn label() -> CurveLabel {
        CurveLabel::parse("USD.LIBOR3M").unwrap()
    }

    fn fitted(name: &str, reference: Date, xs: &[f64], f: impl Fn(f64) -> f64) -> Arc<FittedCurve> {
        let ys = xs.iter().map(|&x| f(x)).collect();
        let spline = SplineFitter
            .fit(&SplineFitRequest::new(name, xs.to_vec(), ys))
            .unwrap();
        Arc::new(FittedCurve::new(label(), reference, spline))
    }

    fn view() -> FittedRateCurve {
        let reference = Date::from_ymd(2025, 4, 1).unwrap();
        let xs = [0.25, 0.5, 0.75, 1.0];
        let df = fitted("df", reference, &xs, |t| 0.99 * (-0.03 * t).exp());
        let cf = fitted("cf", reference, &xs, |_| 0.03);
        let libor = fitted("libor", reference, &xs, |t| 0.031 + 0.001 * t);
        FittedRateCurve::new(Tenor::months(3).unwrap(), df, cf, libor).unwrap()
    }

    #[test]
    fn test_fitted_curve_value_at_date() {
        let reference = Date::from_ymd(2025, 1, 1).unwrap();
        let curve = fitted("line", reference, &[0.0, 1.0, 2.0], |t| 0.02 + 0.01 * t);
        assert_eq!(curve.name(), "line");
        let one_year = Date::from_ymd(2026, 1, 1).unwrap();
        assert_relative_eq!(curve.value_at(one_year).unwrap(), 0.03, epsilon = 1e-14);
        assert_relative_eq!(curve.slope(0.5).unwrap(), 0.01, epsilon = 1e-12);
        assert!(curve.value(f64::NAN).is_err());
    }

    #[test]
    fn test_discount_factor_normalised() {
        let curve = view();
        assert_relative_eq!(curve.discount_factor(0.0).unwrap(), 1.0, epsilon = 1e-14);
        // log-linear data is not reproduced exactly by a cubic fit
        assert_relative_eq!(curve.discount_factor(0.5).unwrap(), (-0.015_f64).exp(), epsilon = 2e-4);
        assert_relative_eq!(curve.instantaneous_forward(0.6).unwrap(), 0.03, epsilon = 1e-14);
    }

    #[test]
    fn test_tenor_matched_estimator_reads_libor_fit() {
        let curve = view();
        let estimator = curve
            .forward_rate_estimator(Tenor::months(3).unwrap(), &label())
            .unwrap();
        assert_relative_eq!(estimator.forward_rate(0.5).unwrap(), 0.0315, epsilon = 1e-12);

        let other = curve
            .forward_rate_estimator(Tenor::months(6).unwrap(), &label())
            .unwrap();
        let expected = curve.forward_rate(0.5, 1.0).unwrap();
        assert_relative_eq!(other.forward_rate(0.5).unwrap(), expected, epsilon = 1e-14);
    }

    #[test]
    fn test_reference_date_mismatch_rejected() {
        let a = Date::from_ymd(2025, 4, 1).unwrap();
        let b = Date::from_ymd(2025, 4, 2).unwrap();
        let xs = [0.25, 0.5];
        let result = FittedRateCurve::new(
            Tenor::months(3).unwrap(),
            fitted("df", a, &xs, |_| 0.99),
            fitted("cf", b, &xs, |_| 0.03),
            fitted("libor", a, &xs, |_| 0.03),
        );
        assert!(result.is_err());
    }
}
