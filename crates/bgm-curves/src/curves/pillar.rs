//! Discount-factor pillar curve.

use bgm_core::{CurveLabel, Date, Tenor};
use bgm_math::interpolation::{Interpolator, LogLinearInterpolator};

use crate::error::{CurveError, CurveResult};
use crate::estimator::CurveForwardEstimator;
use crate::traits::{curve_time, ForwardRateEstimator, RateCurve};

/// A curve through bootstrapped discount-factor pillars, log-linear between
/// pillars (piecewise flat instantaneous forwards) and flat-forward beyond
/// the last one. `DF(0) = 1` is implied.
///
/// ```rust
/// use bgm_core::Date;
/// use bgm_curves::curves::PillarRateCurve;
/// use bgm_curves::RateCurve;
///
/// let spot = Date::from_ymd(2025, 1, 2).unwrap();
/// let curve = PillarRateCurve::builder(spot)
///     .add_pillar(spot.add_months(6).unwrap(), 0.985)
///     .add_pillar(spot.add_years(1).unwrap(), 0.97)
///     .build()
///     .unwrap();
/// assert!(curve.df(spot.add_months(9).unwrap()).unwrap() < 0.985);
/// ```
#[derive(Debug, Clone)]
pub struct PillarRateCurve {
    reference_date: Date,
    interpolator: LogLinearInterpolator,
}

impl PillarRateCurve {
    /// Starts a builder.
    #[must_use]
    pub fn builder(reference_date: Date) -> PillarRateCurveBuilder {
        PillarRateCurveBuilder {
            reference_date,
            pillars: Vec::new(),
        }
    }
}

impl RateCurve for PillarRateCurve {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn discount_factor(&self, t: f64) -> CurveResult<f64> {
        Ok(self.interpolator.interpolate(t)?)
    }

    fn instantaneous_forward(&self, t: f64) -> CurveResult<f64> {
        let df = self.interpolator.interpolate(t)?;
        let slope = self.interpolator.derivative(t)?;
        Ok(-slope / df)
    }

    fn forward_rate_estimator(
        &self,
        tenor: Tenor,
        label: &CurveLabel,
    ) -> CurveResult<Box<dyn ForwardRateEstimator + '_>> {
        Ok(Box::new(CurveForwardEstimator::new(self, tenor, label.clone())))
    }
}

/// Builder for [`PillarRateCurve`].
#[derive(Debug, Clone)]
pub struct PillarRateCurveBuilder {
    reference_date: Date,
    pillars: Vec<(Date, f64)>,
}

impl PillarRateCurveBuilder {
    /// Adds a pillar discount factor.
    #[must_use]
    pub fn add_pillar(mut self, date: Date, discount_factor: f64) -> Self {
        self.pillars.push((date, discount_factor));
        self
    }

    /// Builds the curve.
    ///
    /// # Errors
    ///
    /// Fails without pillars, with a pillar on or before the reference date,
    /// with duplicate dates, or with a non-positive or non-finite discount factor.
    pub fn build(mut self) -> CurveResult<PillarRateCurve> {
        if self.pillars.is_empty() {
            return Err(CurveError::InsufficientPoints {
                required: 1,
                got: 0,
            });
        }
        self.pillars.sort_by_key(|(date, _)| *date);

        let mut times = vec![0.0];
        let mut dfs = vec![1.0];
        for (date, df) in &self.pillars {
            if *date <= self.reference_date {
                return Err(CurveError::builder_error(format!(
                    "pillar {date} is not after reference date {}",
                    self.reference_date
                )));
            }
            if !(df.is_finite() && *df > 0.0) {
                return Err(CurveError::NonPositiveDiscountFactor {
                    t: curve_time(self.reference_date, *date),
                    value: *df,
                });
            }
            times.push(curve_time(self.reference_date, *date));
            dfs.push(*df);
        }

        let interpolator = LogLinearInterpolator::new(times, dfs)
            .map_err(|err| CurveError::builder_error(err.to_string()))?;

        Ok(PillarRateCurve {
            reference_date: self.reference_date,
            interpolator,
        })
    }
}
