//! Full-curve LMM evolution.
//!
//! One call of [`CurveStateEvolver::evolve`] moves a curve snapshot from the
//! view date forward by `dt` years:
//!
//! 1. one multivariate normal draw `Z` is taken for the whole call;
//! 2. for every ladder node `T` the LIBOR, discount-factor, continuous-forward
//!    and spot-rate increments are computed from the current curve and the
//!    volatility model;
//! 3. levels and increments are refitted with the spline service on the node
//!    times measured from the new reference date, giving the next snapshot.

use std::sync::Arc;

use bgm_core::Date;
use bgm_curves::curves::{FittedCurve, FittedRateCurve};
use bgm_curves::traits::curve_time;
use bgm_curves::{ForwardRateEstimator, RateCurve};
use bgm_math::factors::{FactorGenerator, FactorVector};
use bgm_math::finite_difference::{divided_difference, FiniteDifference};
use bgm_math::spline::SplineFitter;
use bgm_math::MathError;
use tracing::{debug, debug_span, trace};

use crate::config::{EvolverConfig, Validate};
use crate::error::{DynamicsError, DynamicsResult};
use crate::ladder::TenorLadderSequence;
use crate::snapshot::{TenorPointFields, TenorPointSnapshot};
use crate::state::{CurveSnapshot, EvolutionInterval, EvolutionState, KeyedRecord, Quantity};
use crate::volatility::{libor_conversion, ForwardVolatilitySchedule, VolatilityModel};

/// Days per year used to turn a step length into calendar days.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Common contract of every evolver.
pub trait StateEvolver: Send + Sync {
    /// Evolves `previous` from `view_date` by `dt` years, consuming exactly one
    /// draw from `generator`.
    ///
    /// # Errors
    ///
    /// Any invalid input, collaborator failure or non-finite intermediate
    /// fails the whole call.
    fn evolve(
        &self,
        spot_date: Date,
        view_date: Date,
        dt: f64,
        previous: &EvolutionState,
        generator: &mut dyn FactorGenerator,
    ) -> DynamicsResult<EvolutionState>;
}

/// Evolves a whole curve and refits it every step.
///
/// ```rust
/// use std::sync::Arc;
///
/// use bgm_core::{CurveLabel, Date, EvolutionLabels, Tenor};
/// use bgm_curves::curves::FlatRateCurve;
/// use bgm_dynamics::prelude::*;
/// use bgm_math::factors::GaussianFactorGenerator;
///
/// let spot = Date::from_ymd(2025, 1, 2).unwrap();
/// let labels = EvolutionLabels::new(
///     CurveLabel::parse("USD.SOFR").unwrap(),
///     CurveLabel::parse("USD.LIBOR3M").unwrap(),
/// );
/// let model = VolatilityModel::builder(spot, labels.forward.clone())
///     .tenor(Tenor::months(3).unwrap())
///     .factor(FlatVolatilitySurface::new(0.15).unwrap())
///     .build()
///     .unwrap();
/// let start = CurveSnapshot::initial(
///     labels.clone(),
///     Arc::new(FlatRateCurve::new(spot, 0.03)),
///     Arc::new(model),
/// );
///
/// let evolver = CurveStateEvolver::new(EvolverConfig::new(labels).with_tenor_count(8)).unwrap();
/// let mut generator = GaussianFactorGenerator::new(1, 7).unwrap();
/// let next = evolver
///     .evolve(spot, spot, 0.25, &EvolutionState::from(start), &mut generator)
///     .unwrap();
/// assert_eq!(next.interval().days(), 91);
/// ```
#[derive(Debug, Clone)]
pub struct CurveStateEvolver {
    config: EvolverConfig,
    differentiator: FiniteDifference,
    fitter: SplineFitter,
}

impl CurveStateEvolver {
    /// Creates an evolver from a validated configuration.
    pub fn new(config: EvolverConfig) -> DynamicsResult<Self> {
        config.validate_or_error()?;
        Ok(Self {
            differentiator: config.finite_difference.differentiator(),
            fitter: SplineFitter,
            config,
        })
    }

    /// The configuration.
    pub fn config(&self) -> &EvolverConfig {
        &self.config
    }

    fn node(&self, step: &Step<'_>, target: Date) -> DynamicsResult<TenorPointSnapshot> {
        let dt = step.dt;
        let sqrt_dt = dt.sqrt();
        let model = step.model;
        let z = &step.shock;

        let lambda = model.factor_point_volatility(step.view_date, target)?;
        let x_target = model.time_from_spot(target);
        let sigma = step.schedule.loading(x_target)?;

        let cross = lambda.dot(&sigma);
        let lognormal_norm = lambda.norm_squared();
        let continuous_forward_norm = sigma.norm_squared();

        // LIBOR
        let t_curve = curve_time(step.estimator.reference_date(), target);
        let libor = step.estimator.forward_rate(t_curve)?;
        let drift_seed = self
            .differentiator
            .derivative(|t| Ok::<_, DynamicsError>(step.estimator.forward_rate(t)?), t_curve)?;
        let accrual = self
            .config
            .day_count
            .year_fraction(target, self.config.forward_tenor.advance(target)?);
        let conversion = libor_conversion(accrual, libor)?;
        let libor_increment = dt * (drift_seed + libor * cross + lognormal_norm * libor * conversion)
            + libor * lambda.dot(z) * sqrt_dt;

        // discount factor
        let discount_factor = step.curve.df_between(step.view_date, target)?;
        let forward = step.curve.instantaneous_forward_at(target)?;
        let discount_factor_increment =
            discount_factor * (step.short_rate - forward) * dt - sigma.dot(z) * sqrt_dt;

        // continuous forward and spot rate from G(x) = ½Δt‖Σ(x)‖² + √Δt Σ(x)·Z
        let g = |x: f64| -> DynamicsResult<f64> {
            let loading = step.schedule.loading(x)?;
            Ok(0.5 * dt * loading.norm_squared() + sqrt_dt * loading.dot(z))
        };
        let continuous_forward_increment = self.differentiator.derivative(&g, x_target)?;
        let x_view = step.x_view;
        let anchored = |x: f64| if x == x_view { Ok(0.0) } else { g(x) };
        let spot_rate_increment = divided_difference(anchored, x_view, x_target)?;

        let span = self.config.day_count.year_fraction(step.view_date, target);
        if span <= 0.0 {
            return Err(MathError::DivisionByZero { value: span }.into());
        }
        let spot_rate = -discount_factor.ln() / span;

        trace!(
            %target,
            libor,
            libor_increment,
            discount_factor,
            discount_factor_increment,
            "ladder node"
        );

        TenorPointSnapshot::new(
            target,
            TenorPointFields {
                libor,
                libor_increment,
                discount_factor,
                discount_factor_increment,
                continuous_forward: forward,
                continuous_forward_increment,
                spot_rate,
                spot_rate_increment,
                lognormal_libor_volatility_norm: lognormal_norm,
                continuous_forward_volatility_norm: continuous_forward_norm,
            },
        )
    }

    fn refit(
        &self,
        ladder: &TenorLadderSequence,
        reference: Date,
    ) -> DynamicsResult<(KeyedRecord<Arc<FittedCurve>>, KeyedRecord<Arc<FittedCurve>>)> {
        let labels = &self.config.labels;
        let xs = ladder.times_from(reference);
        let mut levels = KeyedRecord::new();
        let mut spans = KeyedRecord::new();

        for quantity in Quantity::LEVELS.into_iter().chain(Quantity::INCREMENTS) {
            let label = quantity.owner(labels);
            let request = self.config.spline.request(
                format!("{label}.{quantity}"),
                xs.clone(),
                ladder.series(quantity),
            );
            let spline = self.fitter.fit(&request)?;
            let curve = Arc::new(FittedCurve::new(label.clone(), reference, spline));
            let record = if quantity.is_increment() {
                &mut spans
            } else {
                &mut levels
            };
            record.insert(label.clone(), quantity, curve);
        }
        Ok((levels, spans))
    }
}

/// Everything shared by the nodes of one call.
struct Step<'a> {
    view_date: Date,
    x_view: f64,
    dt: f64,
    shock: FactorVector,
    short_rate: f64,
    model: &'a VolatilityModel,
    curve: &'a dyn RateCurve,
    estimator: &'a dyn ForwardRateEstimator,
    schedule: ForwardVolatilitySchedule,
}

/// Whole days covered by a step of `dt` years, at least one.
pub fn step_days(dt: f64) -> i64 {
    #[allow(clippy::cast_possible_truncation)]
    let days = (dt * DAYS_PER_YEAR).round() as i64;
    days.max(1)
}

/// Draws one shock and checks its dimension.
pub(crate) fn draw_shock(
    generator: &mut dyn FactorGenerator,
    num_factors: usize,
) -> DynamicsResult<FactorVector> {
    let shock = generator.random()?;
    if shock.len() != num_factors {
        return Err(MathError::DimensionMismatch {
            expected: num_factors,
            actual: shock.len(),
        }
        .into());
    }
    for &value in shock.iter() {
        DynamicsError::ensure_finite("factor draw", value)?;
    }
    Ok(shock)
}

/// Checks that `model` describes the ladder of `config` from `spot_date`.
pub(crate) fn check_model(
    config: &EvolverConfig,
    model: &VolatilityModel,
    spot_date: Date,
) -> DynamicsResult<()> {
    if model.spot_date() != spot_date {
        return Err(DynamicsError::invalid_input(format!(
            "volatility model spot {} differs from spot {spot_date}",
            model.spot_date()
        )));
    }
    if model.forward_tenor() != config.forward_tenor {
        return Err(DynamicsError::invalid_input(format!(
            "volatility model tenor {} differs from ladder tenor {}",
            model.forward_tenor(),
            config.forward_tenor
        )));
    }
    if model.forward_label() != &config.labels.forward {
        return Err(DynamicsError::invalid_input(format!(
            "volatility model describes {}, not {}",
            model.forward_label(),
            config.labels.forward
        )));
    }
    Ok(())
}

/// Validates the step arguments shared by every evolver.
pub(crate) fn check_step(spot_date: Date, view_date: Date, dt: f64) -> DynamicsResult<()> {
    if view_date < spot_date {
        return Err(DynamicsError::invalid_input(format!(
            "view date {view_date} is before spot {spot_date}"
        )));
    }
    if !(dt.is_finite() && dt > 0.0) {
        return Err(DynamicsError::invalid_input(format!(
            "step length must be positive and finite, got {dt}"
        )));
    }
    Ok(())
}

impl StateEvolver for CurveStateEvolver {
    fn evolve(
        &self,
        spot_date: Date,
        view_date: Date,
        dt: f64,
        previous: &EvolutionState,
        generator: &mut dyn FactorGenerator,
    ) -> DynamicsResult<EvolutionState> {
        let span = debug_span!("evolve", %spot_date, %view_date, dt, nodes = self.config.tenor_count);
        let _enter = span.enter();

        check_step(spot_date, view_date, dt)?;
        let snapshot = previous.expect_curve()?;
        if snapshot.labels() != &self.config.labels {
            return Err(DynamicsError::LabelMismatch {
                expected: self.config.labels.clone(),
                actual: snapshot.labels().clone(),
            });
        }
        let model = snapshot.model().as_ref();
        check_model(&self.config, model, spot_date)?;

        let shock = draw_shock(generator, model.num_factors())?;

        let tenor = self.config.forward_tenor;
        let node_count = i32::try_from(self.config.tenor_count)
            .map_err(|_| DynamicsError::invalid_input("tenor count overflows"))?;
        let targets = (1..=node_count)
            .map(|i| tenor.advance_n(view_date, i))
            .collect::<Result<Vec<_>, _>>()?;
        let horizon = match targets.last() {
            Some(&last) => tenor.advance(last)?,
            None => return Err(DynamicsError::invalid_input("tenor ladder has no nodes")),
        };

        let curve = snapshot.curve().as_ref();
        let estimator = curve.forward_rate_estimator(tenor, &self.config.labels.forward)?;
        let schedule = model.forward_volatility_schedule(horizon, estimator.as_ref())?;
        let step = Step {
            view_date,
            x_view: model.time_from_spot(view_date),
            dt,
            shock,
            short_rate: curve.instantaneous_forward_at(view_date)?,
            model,
            curve,
            estimator: estimator.as_ref(),
            schedule,
        };

        let points = targets
            .iter()
            .map(|&target| self.node(&step, target))
            .collect::<DynamicsResult<Vec<_>>>()?;
        let ladder = TenorLadderSequence::from_snapshots(&points)?;

        let reference = view_date.add_days(step_days(dt));
        let (levels, spans) = self.refit(&ladder, reference)?;

        let labels = &self.config.labels;
        let fitted = |quantity: Quantity| -> DynamicsResult<Arc<FittedCurve>> {
            Ok(Arc::clone(levels.get(quantity.owner(labels), quantity)?))
        };
        let view = FittedRateCurve::new(
            tenor,
            fitted(Quantity::DiscountFactor)?,
            fitted(Quantity::ContinuousForward)?,
            fitted(Quantity::Libor)?,
        )?;

        debug!(
            %reference,
            nodes = ladder.len(),
            first_libor_increment = ladder.libor_increments()[0],
            "curve evolved"
        );

        let interval = EvolutionInterval::new(view_date, reference)?;
        Ok(EvolutionState::Curve(Arc::new(CurveSnapshot::evolved(
            interval,
            Arc::new(view),
            levels,
            spans,
            snapshot,
        ))))
    }
}
