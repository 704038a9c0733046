//! Forward-rate estimator backed by a curve's discount factors.

use bgm_core::{CurveLabel, Date, Tenor};

use crate::error::{CurveError, CurveResult};
use crate::traits::{ForwardRateEstimator, RateCurve};

/// Projects `L(t) = (DF(t) / DF(t + τ) - 1) / τ` from any [`RateCurve`],
/// with `τ` the nominal tenor length.
#[derive(Debug, Clone)]
pub struct CurveForwardEstimator<'a> {
    curve: &'a dyn RateCurve,
    tenor: Tenor,
    label: CurveLabel,
}

impl<'a> CurveForwardEstimator<'a> {
    /// Creates an estimator over `curve`.
    #[must_use]
    pub fn new(curve: &'a dyn RateCurve, tenor: Tenor, label: CurveLabel) -> Self {
        Self {
            curve,
            tenor,
            label,
        }
    }
}

impl ForwardRateEstimator for CurveForwardEstimator<'_> {
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
        CurveError::ensure_finite("fixing time", t)?;
        self.curve.forward_rate(t, t + self.accrual())
    }
}
