//! Multi-factor deterministic volatility.
//!
//! Each factor is a [`VolatilitySurface`] over `(x, y)`, both measured in
//! years from the model's spot date: `x` is the observation time and `y` the
//! fixing time of the LIBOR rate. The [`VolatilityModel`] turns the raw
//! LIBOR loadings into continuously-compounded forward loadings by
//! integrating them along the forward-tenor ladder.

use std::fmt;
use std::sync::Arc;

use bgm_core::{CurveLabel, Date, DayCountConvention, Tenor};
use bgm_curves::{ForwardRateEstimator, RateCurve};
use bgm_math::factors::FactorVector;

use crate::error::{DynamicsError, DynamicsResult};

/// One volatility factor.
pub trait VolatilitySurface: Send + Sync + fmt::Debug {
    /// Deterministic factor loading at observation time `x` for the fixing at `y`.
    fn node(&self, x: f64, y: f64) -> DynamicsResult<f64>;
}

// =============================================================================
// SURFACES
// =============================================================================

/// The same loading everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatVolatilitySurface {
    volatility: f64,
}

impl FlatVolatilitySurface {
    /// Creates a flat surface.
    pub fn new(volatility: f64) -> DynamicsResult<Self> {
        DynamicsError::ensure_finite("flat volatility", volatility)?;
        Ok(Self { volatility })
    }

    /// The loading.
    pub fn volatility(&self) -> f64 {
        self.volatility
    }
}

impl VolatilitySurface for FlatVolatilitySurface {
    fn node(&self, _x: f64, _y: f64) -> DynamicsResult<f64> {
        Ok(self.volatility)
    }
}

/// Rebonato's time-homogeneous hump, `(a + b·u)·e^{-c·u} + d` with
/// `u = y - x`, scaled by a factor loading.
///
/// Loadings are zero once the rate has fixed (`u < 0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AbcdVolatilitySurface {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    loading: f64,
}

impl AbcdVolatilitySurface {
    /// Creates a surface with unit loading.
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> DynamicsResult<Self> {
        for (name, value) in [("a", a), ("b", b), ("c", c), ("d", d)] {
            DynamicsError::ensure_finite(name, value)?;
        }
        if c < 0.0 {
            return Err(DynamicsError::invalid_input(format!(
                "abcd decay c must be non-negative, got {c}"
            )));
        }
        Ok(Self {
            a,
            b,
            c,
            d,
            loading: 1.0,
        })
    }

    /// Scales the surface by `loading`.
    pub fn with_loading(mut self, loading: f64) -> DynamicsResult<Self> {
        self.loading = DynamicsError::ensure_finite("factor loading", loading)?;
        Ok(self)
    }

    /// Unscaled hump at time-to-fixing `u`.
    pub fn hump(&self, u: f64) -> f64 {
        if u < 0.0 {
            return 0.0;
        }
        (self.a + self.b * u) * (-self.c * u).exp() + self.d
    }
}

impl VolatilitySurface for AbcdVolatilitySurface {
    fn node(&self, x: f64, y: f64) -> DynamicsResult<f64> {
        DynamicsError::ensure_finite("abcd node", self.loading * self.hump(y - x))
    }
}

/// Bilinear interpolation on an `(x, y)` grid, flat outside it.
#[derive(Debug, Clone, PartialEq)]
pub struct GridVolatilitySurface {
    xs: Vec<f64>,
    ys: Vec<f64>,
    // values[i][j] at (xs[i], ys[j])
    values: Vec<Vec<f64>>,
}

impl GridVolatilitySurface {
    /// Creates a grid surface. Both axes must be non-empty and strictly
    /// increasing, and `values` must have one row per `x` and one column per `y`.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>, values: Vec<Vec<f64>>) -> DynamicsResult<Self> {
        validate_axis("x", &xs)?;
        validate_axis("y", &ys)?;
        if values.len() != xs.len() {
            return Err(DynamicsError::invalid_input(format!(
                "grid has {} rows for {} x values",
                values.len(),
                xs.len()
            )));
        }
        for (i, row) in values.iter().enumerate() {
            if row.len() != ys.len() {
                return Err(DynamicsError::invalid_input(format!(
                    "grid row {i} has {} columns for {} y values",
                    row.len(),
                    ys.len()
                )));
            }
            for &value in row {
                DynamicsError::ensure_finite("grid volatility", value)?;
            }
        }
        Ok(Self { xs, ys, values })
    }
}

impl VolatilitySurface for GridVolatilitySurface {
    fn node(&self, x: f64, y: f64) -> DynamicsResult<f64> {
        DynamicsError::ensure_finite("grid x", x)?;
        DynamicsError::ensure_finite("grid y", y)?;
        let (i0, i1, wx) = bracket(&self.xs, x);
        let (j0, j1, wy) = bracket(&self.ys, y);
        let low = self.values[i0][j0] * (1.0 - wy) + self.values[i0][j1] * wy;
        let high = self.values[i1][j0] * (1.0 - wy) + self.values[i1][j1] * wy;
        Ok(low * (1.0 - wx) + high * wx)
    }
}

fn validate_axis(name: &str, axis: &[f64]) -> DynamicsResult<()> {
    if axis.is_empty() {
        return Err(DynamicsError::invalid_input(format!("grid {name} axis is empty")));
    }
    for &value in axis {
        DynamicsError::ensure_finite("grid axis", value)?;
    }
    if axis.windows(2).any(|w| w[1] <= w[0]) {
        return Err(DynamicsError::invalid_input(format!(
            "grid {name} axis must be strictly increasing"
        )));
    }
    Ok(())
}

/// Neighbouring indices and the weight of the upper one, clamped to the axis.
fn bracket(axis: &[f64], v: f64) -> (usize, usize, f64) {
    let last = axis.len() - 1;
    if v <= axis[0] {
        return (0, 0, 0.0);
    }
    if v >= axis[last] {
        return (last, last, 0.0);
    }
    let upper = axis.partition_point(|&a| a <= v);
    let lower = upper - 1;
    let weight = (v - axis[lower]) / (axis[upper] - axis[lower]);
    (lower, upper, weight)
}

// =============================================================================
// VOLATILITY MODEL
// =============================================================================

/// Per-factor volatility of the forward curve identified by a label and tenor.
///
/// ```rust
/// use bgm_core::{CurveLabel, Date, Tenor};
/// use bgm_dynamics::volatility::{FlatVolatilitySurface, VolatilityModel};
///
/// let spot = Date::from_ymd(2025, 1, 2).unwrap();
/// let model = VolatilityModel::builder(spot, CurveLabel::parse("USD.LIBOR3M").unwrap())
///     .tenor(Tenor::months(3).unwrap())
///     .factor(FlatVolatilitySurface::new(0.15).unwrap())
///     .factor(FlatVolatilitySurface::new(0.05).unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(model.num_factors(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct VolatilityModel {
    spot_date: Date,
    forward_label: CurveLabel,
    forward_tenor: Tenor,
    day_count: DayCountConvention,
    factors: Vec<Arc<dyn VolatilitySurface>>,
}

impl VolatilityModel {
    /// Starts a builder.
    pub fn builder(spot_date: Date, forward_label: CurveLabel) -> VolatilityModelBuilder {
        VolatilityModelBuilder {
            spot_date,
            forward_label,
            forward_tenor: None,
            day_count: DayCountConvention::default(),
            factors: Vec::new(),
        }
    }

    /// Number of factors.
    pub fn num_factors(&self) -> usize {
        self.factors.len()
    }

    /// Time origin of every surface.
    pub fn spot_date(&self) -> Date {
        self.spot_date
    }

    /// Label of the modelled forward curve.
    pub fn forward_label(&self) -> &CurveLabel {
        &self.forward_label
    }

    /// Tenor of the modelled LIBOR rates.
    pub fn forward_tenor(&self) -> Tenor {
        self.forward_tenor
    }

    /// Day count of surface coordinates and accruals.
    pub fn day_count(&self) -> DayCountConvention {
        self.day_count
    }

    /// Surface coordinate of `date`.
    pub fn time_from_spot(&self, date: Date) -> f64 {
        self.day_count.year_fraction(self.spot_date, date)
    }

    /// Raw LIBOR factor loadings, one `node(x, y)` per factor with
    /// `x = yf(spot, date1)` and `y = yf(spot, date2)`.
    pub fn factor_point_volatility(&self, date1: Date, date2: Date) -> DynamicsResult<FactorVector> {
        self.factor_nodes(self.time_from_spot(date1), self.time_from_spot(date2))
    }

    /// Loadings of the continuously-compounded forward maturing at `target_date`.
    ///
    /// Steps from the spot date in forward tenors. Each step `s` contributes
    /// `w·τL/(1+τL)·raw(s)`, where `τ` is the tenor accrual starting at `s`,
    /// `L` the estimator's fixing at `s` and `w = min(1, yf(s, target)/τ)`.
    ///
    /// # Errors
    ///
    /// Fails when `target_date` is on or before the spot date.
    pub fn continuous_forward_volatility(
        &self,
        target_date: Date,
        estimator: &dyn ForwardRateEstimator,
    ) -> DynamicsResult<FactorVector> {
        if target_date <= self.spot_date {
            return Err(DynamicsError::invalid_input(format!(
                "target {target_date} is not after spot {}",
                self.spot_date
            )));
        }
        let schedule = self.forward_volatility_schedule(target_date, estimator)?;
        schedule.loading(self.time_from_spot(target_date))
    }

    /// Calibration target for the continuous-forward loading at `target_date`:
    /// the surface value at (spot, target) times `τL/(1+τL)` for the curve
    /// forward over `[target, target + tenor]`.
    pub fn continuous_forward_volatility_constraint(
        &self,
        curve: &dyn RateCurve,
        target_date: Date,
    ) -> DynamicsResult<FactorVector> {
        let end = self.forward_tenor.advance(target_date)?;
        let libor = curve.forward(target_date, end)?;
        let accrual = self.day_count.year_fraction(target_date, end);
        let conversion = libor_conversion(accrual, libor)?;
        let raw = self.factor_point_volatility(self.spot_date, target_date)?;
        Ok(raw * conversion)
    }

    /// Precomputes the step contributions up to `horizon`, so continuous-forward
    /// loadings at any time up to the horizon are cheap to evaluate.
    pub fn forward_volatility_schedule(
        &self,
        horizon: Date,
        estimator: &dyn ForwardRateEstimator,
    ) -> DynamicsResult<ForwardVolatilitySchedule> {
        let mut steps = Vec::new();
        let mut index = 0;
        let mut start = self.spot_date;
        while start < horizon {
            let end = self.forward_tenor.advance_n(self.spot_date, index + 1)?;
            let accrual = self.day_count.year_fraction(start, end);
            let libor = estimator.forward_rate_at(start)?;
            let conversion = libor_conversion(accrual, libor)?;
            let raw = self.factor_point_volatility(self.spot_date, start)?;
            steps.push(ScheduleStep {
                start: self.time_from_spot(start),
                accrual,
                loading: raw * conversion,
            });
            index += 1;
            start = end;
        }
        Ok(ForwardVolatilitySchedule {
            num_factors: self.num_factors(),
            steps,
        })
    }

    fn factor_nodes(&self, x: f64, y: f64) -> DynamicsResult<FactorVector> {
        let values = self
            .factors
            .iter()
            .map(|surface| {
                let value = surface.node(x, y)?;
                DynamicsError::ensure_finite("factor volatility", value)
            })
            .collect::<DynamicsResult<Vec<f64>>>()?;
        Ok(FactorVector::from_vec(values))
    }
}

/// `τL/(1+τL)`, the LIBOR-to-continuous volatility conversion.
pub fn libor_conversion(accrual: f64, libor: f64) -> DynamicsResult<f64> {
    let scaled = accrual * libor;
    if scaled <= -1.0 {
        return Err(DynamicsError::invalid_input(format!(
            "accrued rate {scaled} makes the conversion singular"
        )));
    }
    DynamicsError::ensure_finite("libor conversion", scaled / (1.0 + scaled))
}

/// Builder for [`VolatilityModel`].
#[derive(Debug, Clone)]
pub struct VolatilityModelBuilder {
    spot_date: Date,
    forward_label: CurveLabel,
    forward_tenor: Option<Tenor>,
    day_count: DayCountConvention,
    factors: Vec<Arc<dyn VolatilitySurface>>,
}

impl VolatilityModelBuilder {
    /// Sets the forward tenor.
    #[must_use]
    pub fn tenor(mut self, tenor: Tenor) -> Self {
        self.forward_tenor = Some(tenor);
        self
    }

    /// Sets the day count.
    #[must_use]
    pub fn day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = day_count;
        self
    }

    /// Adds a factor.
    #[must_use]
    pub fn factor(self, surface: impl VolatilitySurface + 'static) -> Self {
        self.shared_factor(Arc::new(surface))
    }

    /// Adds a factor shared with other models.
    #[must_use]
    pub fn shared_factor(mut self, surface: Arc<dyn VolatilitySurface>) -> Self {
        self.factors.push(surface);
        self
    }

    /// Builds the model.
    ///
    /// # Errors
    ///
    /// Fails without a tenor or without factors.
    pub fn build(self) -> DynamicsResult<VolatilityModel> {
        let Some(forward_tenor) = self.forward_tenor else {
            return Err(DynamicsError::invalid_input("volatility model has no forward tenor"));
        };
        if self.factors.is_empty() {
            return Err(DynamicsError::invalid_input("volatility model has no factors"));
        }
        Ok(VolatilityModel {
            spot_date: self.spot_date,
            forward_label: self.forward_label,
            forward_tenor,
            day_count: self.day_count,
            factors: self.factors,
        })
    }
}

// =============================================================================
// SCHEDULE
// =============================================================================

#[derive(Debug, Clone)]
struct ScheduleStep {
    start: f64,
    accrual: f64,
    loading: FactorVector,
}

/// Step contributions of the continuous-forward loading, on the model's
/// spot-relative time axis.
#[derive(Debug, Clone)]
pub struct ForwardVolatilitySchedule {
    num_factors: usize,
    steps: Vec<ScheduleStep>,
}

impl ForwardVolatilitySchedule {
    /// Last time at which the schedule is complete.
    pub fn horizon(&self) -> f64 {
        self.steps.last().map_or(0.0, |step| step.start + step.accrual)
    }

    /// Loading at spot-relative time `t`, pro-rating the step containing `t`.
    ///
    /// # Errors
    ///
    /// Fails for `t <= 0` and beyond the horizon.
    pub fn loading(&self, t: f64) -> DynamicsResult<FactorVector> {
        DynamicsError::ensure_finite("schedule time", t)?;
        if t <= 0.0 || t > self.horizon() {
            return Err(DynamicsError::invalid_input(format!(
                "time {t} outside schedule (0, {}]",
                self.horizon()
            )));
        }
        let mut loading = FactorVector::zeros(self.num_factors);
        for step in self.steps.iter().take_while(|step| step.start < t) {
            let weight = ((t - step.start) / step.accrual).min(1.0);
            loading += &step.loading * weight;
        }
        Ok(loading)
    }
}
