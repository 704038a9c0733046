//! Curve capability traits.
//!
//! [`RateCurve`] is the one capability every evolving curve offers: discount
//! factors, forward rates and instantaneous forwards on a time axis measured
//! in ACT/365F years from the curve's reference date, plus date conveniences.
//! [`ForwardRateEstimator`] projects the simple forward rate of a fixed tenor.

use std::fmt::Debug;

use bgm_core::{CurveLabel, Date, Tenor};
use bgm_math::finite_difference::{derivative, DifferenceScheme};

use crate::error::{CurveError, CurveResult};

/// Step used by the default instantaneous forward, in years.
pub const INSTANTANEOUS_FORWARD_STEP: f64 = 1e-4;

/// Year fraction from `reference` to `date` on the curve time axis (ACT/365F).
#[must_use]
pub fn curve_time(reference: Date, date: Date) -> f64 {
    reference.days_between(&date) as f64 / 365.0
}

/// The core trait for rate curves.
///
/// Implementations provide [`discount_factor`](RateCurve::discount_factor),
/// [`reference_date`](RateCurve::reference_date) and
/// [`forward_rate_estimator`](RateCurve::forward_rate_estimator); everything
/// else has a default derived from discount factors.
pub trait RateCurve: Send + Sync + Debug {
    /// Returns the curve's reference date. Time zero of the curve.
    fn reference_date(&self) -> Date;

    /// Returns the discount factor from the reference date to time `t`.
    fn discount_factor(&self, t: f64) -> CurveResult<f64>;

    /// Returns the simply-compounded forward rate between times `t1` and `t2`.
    ///
    /// `F(t1, t2) = (DF(t1) / DF(t2) - 1) / (t2 - t1)`
    ///
    /// # Errors
    ///
    /// Fails when `t2 <= t1` or when `DF(t2)` is not positive.
    fn forward_rate(&self, t1: f64, t2: f64) -> CurveResult<f64> {
        if t1.is_nan() || t2.is_nan() || t2 <= t1 {
            return Err(CurveError::InvalidPeriod { start: t1, end: t2 });
        }
        let df1 = self.discount_factor(t1)?;
        let df2 = self.discount_factor(t2)?;
        if df2 <= 0.0 {
            return Err(CurveError::NonPositiveDiscountFactor { t: t2, value: df2 });
        }
        CurveError::ensure_finite("forward rate", (df1 / df2 - 1.0) / (t2 - t1))
    }

    /// Returns the instantaneous forward rate `f(t) = -d ln DF(t) / dt`.
    ///
    /// The default differentiates `ln DF` with a central difference.
    fn instantaneous_forward(&self, t: f64) -> CurveResult<f64> {
        let log_df = |x: f64| -> CurveResult<f64> {
            let df = self.discount_factor(x)?;
            if df <= 0.0 {
                return Err(CurveError::NonPositiveDiscountFactor { t: x, value: df });
            }
            Ok(df.ln())
        };
        let slope = derivative(log_df, t, INSTANTANEOUS_FORWARD_STEP, DifferenceScheme::Central)?;
        Ok(-slope)
    }

    /// Builds the forward-rate estimator of this curve for `tenor` fixings.
    fn forward_rate_estimator(
        &self,
        tenor: Tenor,
        label: &CurveLabel,
    ) -> CurveResult<Box<dyn ForwardRateEstimator + '_>>;

    /// Returns the year fraction from the reference date to `date`.
    fn year_fraction(&self, date: Date) -> f64 {
        curve_time(self.reference_date(), date)
    }

    /// Discount factor to `date`.
    fn df(&self, date: Date) -> CurveResult<f64> {
        self.discount_factor(self.year_fraction(date))
    }

    /// Discount factor from `from` to `to` as seen on this curve, `DF(to) / DF(from)`.
    fn df_between(&self, from: Date, to: Date) -> CurveResult<f64> {
        let start = self.df(from)?;
        if start <= 0.0 {
            return Err(CurveError::NonPositiveDiscountFactor {
                t: self.year_fraction(from),
                value: start,
            });
        }
        Ok(self.df(to)? / start)
    }

    /// Simple forward rate between two dates.
    fn forward(&self, start: Date, end: Date) -> CurveResult<f64> {
        self.forward_rate(self.year_fraction(start), self.year_fraction(end))
    }

    /// Instantaneous forward rate at `date`.
    fn instantaneous_forward_at(&self, date: Date) -> CurveResult<f64> {
        self.instantaneous_forward(self.year_fraction(date))
    }
}

/// Projects simple forward rates of one tenor.
///
/// `forward_rate(t)` is the rate of the fixing that starts `t` years after
/// the reference date and accrues over [`accrual`](ForwardRateEstimator::accrual)
/// years. Being a plain function of `t`, it can be differentiated directly.
pub trait ForwardRateEstimator: Send + Sync {
    /// Label of the projected index.
    fn label(&self) -> &CurveLabel;

    /// Fixing tenor.
    fn tenor(&self) -> Tenor;

    /// Time zero of the estimator.
    fn reference_date(&self) -> Date;

    /// Accrual length of one fixing, in years.
    fn accrual(&self) -> f64 {
        self.tenor().nominal_years()
    }

    /// Forward rate of the fixing starting at time `t`.
    fn forward_rate(&self, t: f64) -> CurveResult<f64>;

    /// Forward rate of the fixing starting on `date`.
    fn forward_rate_at(&self, date: Date) -> CurveResult<f64> {
        self.forward_rate(curve_time(self.reference_date(), date))
    }
}
