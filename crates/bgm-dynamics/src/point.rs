//! Single-rate evolvers.
//!
//! These follow one fixing date without refitting the curve. Seeded from an
//! estimator, the fixing is `T = view + offset·tenor`; chained, it stays the
//! date of the previous [`TimePointSnapshot`] so one rate is carried through
//! the whole path.

use std::sync::Arc;

use bgm_core::Date;
use bgm_curves::traits::curve_time;
use bgm_curves::RateCurve;
use bgm_math::factors::{FactorGenerator, FactorVector};
use bgm_math::finite_difference::FiniteDifference;
use tracing::{debug, debug_span};

use crate::config::{EvolverConfig, Validate};
use crate::error::{DynamicsError, DynamicsResult};
use crate::evolver::{check_model, check_step, draw_shock, step_days, StateEvolver};
use crate::snapshot::TimePointSnapshot;
use crate::state::{EvolutionInterval, EvolutionState, PointSnapshot};
use crate::volatility::{libor_conversion, ForwardVolatilitySchedule, VolatilityModel};

/// Where a point evolver takes its starting rate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointSeed {
    /// The previous point state: its fixing date, its evolved rate, and for
    /// LIBOR its drift seed.
    Chain,
    /// A forward-rate estimator on the current curve, with the volatility
    /// model of a curve snapshot when one is given.
    #[default]
    Estimator,
}

/// Set-up shared by both point evolvers.
#[derive(Debug, Clone)]
struct PointSetup {
    config: EvolverConfig,
    model: Arc<VolatilityModel>,
    curve: Arc<dyn RateCurve>,
    offset: i32,
    seed: PointSeed,
    differentiator: FiniteDifference,
}

/// Inputs resolved at the start of a call.
struct PointStep<'a> {
    target: Date,
    x_target: f64,
    dt: f64,
    shock: FactorVector,
    model: &'a VolatilityModel,
    curve: &'a dyn RateCurve,
    chained: Option<TimePointSnapshot>,
    schedule: ForwardVolatilitySchedule,
}

impl PointSetup {
    fn new(
        config: EvolverConfig,
        model: Arc<VolatilityModel>,
        curve: Arc<dyn RateCurve>,
        offset: u32,
        seed: PointSeed,
    ) -> DynamicsResult<Self> {
        config.validate_or_error()?;
        if offset == 0 {
            return Err(DynamicsError::invalid_input("point offset must be at least one tenor"));
        }
        let offset = i32::try_from(offset)
            .map_err(|_| DynamicsError::invalid_input(format!("point offset {offset} overflows")))?;
        if model.forward_tenor() != config.forward_tenor {
            return Err(DynamicsError::invalid_input(format!(
                "volatility model tenor {} differs from {}",
                model.forward_tenor(),
                config.forward_tenor
            )));
        }
        Ok(Self {
            differentiator: config.finite_difference.differentiator(),
            config,
            model,
            curve,
            offset,
            seed,
        })
    }

    fn prepare<'a>(
        &'a self,
        spot_date: Date,
        view_date: Date,
        dt: f64,
        previous: &'a EvolutionState,
        generator: &mut dyn FactorGenerator,
    ) -> DynamicsResult<PointStep<'a>> {
        check_step(spot_date, view_date, dt)?;
        if previous.labels() != &self.config.labels {
            return Err(DynamicsError::LabelMismatch {
                expected: self.config.labels.clone(),
                actual: previous.labels().clone(),
            });
        }

        let (model, curve, chained) = match (self.seed, previous) {
            (PointSeed::Chain, _) => (
                self.model.as_ref(),
                self.curve.as_ref(),
                Some(*previous.expect_point()?.point()),
            ),
            (PointSeed::Estimator, EvolutionState::Curve(snapshot)) => {
                (snapshot.model().as_ref(), snapshot.curve().as_ref(), None)
            }
            (PointSeed::Estimator, EvolutionState::Point(_)) => {
                (self.model.as_ref(), self.curve.as_ref(), None)
            }
        };
        check_model(&self.config, model, spot_date)?;

        let tenor = self.config.forward_tenor;
        let target = match &chained {
            Some(point) => point.date(),
            None => tenor.advance_n(view_date, self.offset)?,
        };
        if target <= view_date {
            return Err(DynamicsError::invalid_input(format!(
                "fixing {target} is not after view date {view_date}"
            )));
        }

        let shock = draw_shock(generator, model.num_factors())?;
        let estimator = curve.forward_rate_estimator(tenor, &self.config.labels.forward)?;
        let schedule = model.forward_volatility_schedule(tenor.advance(target)?, estimator.as_ref())?;

        Ok(PointStep {
            target,
            x_target: model.time_from_spot(target),
            dt,
            shock,
            model,
            curve,
            chained,
            schedule,
        })
    }

    fn finish(
        &self,
        view_date: Date,
        dt: f64,
        point: TimePointSnapshot,
    ) -> DynamicsResult<EvolutionState> {
        let interval = EvolutionInterval::new(view_date, view_date.add_days(step_days(dt)))?;
        debug!(
            target = %point.date(),
            rate = point.rate(),
            increment = point.rate_increment(),
            "point evolved"
        );
        Ok(EvolutionState::Point(PointSnapshot::new(
            interval,
            self.config.labels.clone(),
            point,
        )))
    }
}

// =============================================================================
// LIBOR
// =============================================================================

/// Evolves one LIBOR fixing with the lognormal LMM increment.
#[derive(Debug, Clone)]
pub struct LiborPointEvolver {
    setup: PointSetup,
}

impl LiborPointEvolver {
    /// Creates an evolver for the fixing `offset` tenors after each view date,
    /// or for the chained fixing in [`PointSeed::Chain`] mode.
    ///
    /// `curve` supplies the continuous-forward loadings, and the starting
    /// LIBOR when seeding from the estimator of a point state.
    pub fn new(
        config: EvolverConfig,
        model: Arc<VolatilityModel>,
        curve: Arc<dyn RateCurve>,
        offset: u32,
        seed: PointSeed,
    ) -> DynamicsResult<Self> {
        Ok(Self {
            setup: PointSetup::new(config, model, curve, offset, seed)?,
        })
    }

    /// Seeding mode.
    pub fn seed(&self) -> PointSeed {
        self.setup.seed
    }
}

impl StateEvolver for LiborPointEvolver {
    fn evolve(
        &self,
        spot_date: Date,
        view_date: Date,
        dt: f64,
        previous: &EvolutionState,
        generator: &mut dyn FactorGenerator,
    ) -> DynamicsResult<EvolutionState> {
        let span = debug_span!("evolve_libor_point", %view_date, dt);
        let _enter = span.enter();

        let setup = &self.setup;
        let step = setup.prepare(spot_date, view_date, dt, previous, generator)?;
        let tenor = setup.config.forward_tenor;

        let lambda = step.model.factor_point_volatility(view_date, step.target)?;
        let sigma = step.schedule.loading(step.x_target)?;

        let (libor, drift_seed) = match step.chained {
            Some(point) => (point.evolved_rate(), point.drift_seed()),
            None => {
                let estimator =
                    step.curve.forward_rate_estimator(tenor, &setup.config.labels.forward)?;
                let t = curve_time(estimator.reference_date(), step.target);
                let drift = setup
                    .differentiator
                    .derivative(|x| Ok::<_, DynamicsError>(estimator.forward_rate(x)?), t)?;
                (estimator.forward_rate(t)?, drift)
            }
        };

        let accrual = setup
            .config
            .day_count
            .year_fraction(step.target, tenor.advance(step.target)?);
        let conversion = libor_conversion(accrual, libor)?;
        let lognormal_norm = lambda.norm_squared();
        let increment = step.dt
            * (drift_seed + libor * lambda.dot(&sigma) + lognormal_norm * libor * conversion)
            + libor * lambda.dot(&step.shock) * step.dt.sqrt();

        let point = TimePointSnapshot::new(step.target, libor, increment, drift_seed, lognormal_norm)?;
        setup.finish(view_date, dt, point)
    }
}

// =============================================================================
// CONTINUOUS FORWARD
// =============================================================================

/// Evolves one instantaneous continuous forward: `½Δt·∂/∂T‖Σ(T)‖²` plus
/// `√Δt·∂/∂T[Σ(T)·Z]`.
#[derive(Debug, Clone)]
pub struct ContinuousForwardPointEvolver {
    setup: PointSetup,
}

impl ContinuousForwardPointEvolver {
    /// Creates an evolver for the forward `offset` tenors after each view date.
    pub fn new(
        config: EvolverConfig,
        model: Arc<VolatilityModel>,
        curve: Arc<dyn RateCurve>,
        offset: u32,
        seed: PointSeed,
    ) -> DynamicsResult<Self> {
        Ok(Self {
            setup: PointSetup::new(config, model, curve, offset, seed)?,
        })
    }

    /// Seeding mode.
    pub fn seed(&self) -> PointSeed {
        self.setup.seed
    }
}

impl StateEvolver for ContinuousForwardPointEvolver {
    fn evolve(
        &self,
        spot_date: Date,
        view_date: Date,
        dt: f64,
        previous: &EvolutionState,
        generator: &mut dyn FactorGenerator,
    ) -> DynamicsResult<EvolutionState> {
        let span = debug_span!("evolve_forward_point", %view_date, dt);
        let _enter = span.enter();

        let setup = &self.setup;
        let step = setup.prepare(spot_date, view_date, dt, previous, generator)?;

        let forward = match step.chained {
            Some(point) => point.evolved_rate(),
            None => step.curve.instantaneous_forward_at(step.target)?,
        };

        let schedule = &step.schedule;
        let z = &step.shock;
        let variance = |x: f64| -> DynamicsResult<f64> { Ok(schedule.loading(x)?.norm_squared()) };
        let exposure = |x: f64| -> DynamicsResult<f64> { Ok(schedule.loading(x)?.dot(z)) };
        let half_variance_slope = 0.5 * setup.differentiator.derivative(variance, step.x_target)?;
        let diffusion_slope = setup.differentiator.derivative(exposure, step.x_target)?;
        let increment = step.dt * half_variance_slope + step.dt.sqrt() * diffusion_slope;

        let norm = schedule.loading(step.x_target)?.norm_squared();
        let point = TimePointSnapshot::new(step.target, forward, increment, half_variance_slope, norm)?;
        setup.finish(view_date, dt, point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bgm_core::{CurveLabel, DayCountConvention, EvolutionLabels, Tenor};
    use bgm_curves::curves::FlatRateCurve;
    use bgm_math::factors::SequenceFactorGenerator;

    use crate::state::CurveSnapshot;
    use crate::volatility::FlatVolatilitySurface;

    fn spot() -> Date {
        Date::from_ymd(2025, 1, 2).unwrap()
    }

    fn labels() -> EvolutionLabels {
        EvolutionLabels::new(
            CurveLabel::parse("USD.SOFR").unwrap(),
            CurveLabel::parse("USD.LIBOR3M").unwrap(),
        )
    }

    fn model(vol: f64) -> Arc<VolatilityModel> {
        Arc::new(
            VolatilityModel::builder(spot(), labels().forward)
                .tenor(Tenor::months(3).unwrap())
                .factor(FlatVolatilitySurface::new(vol).unwrap())
                .build()
                .unwrap(),
        )
    }

    fn curve() -> Arc<dyn RateCurve> {
        Arc::new(FlatRateCurve::new(spot(), 0.03))
    }

    fn curve_state(vol: f64) -> EvolutionState {
        CurveSnapshot::initial(labels(), curve(), model(vol)).into()
    }

    fn zero_draws() -> SequenceFactorGenerator {
        SequenceFactorGenerator::repeating(FactorVector::from_vec(vec![0.0])).unwrap()
    }

    #[test]
    fn test_libor_estimator_seed() {
        let evolver = LiborPointEvolver::new(
            EvolverConfig::new(labels()),
            model(0.0),
            curve(),
            4,
            PointSeed::Estimator,
        )
        .unwrap();
        let state = evolver
            .evolve(spot(), spot(), 0.25, &curve_state(0.0), &mut zero_draws())
            .unwrap();
        let point = state.expect_point().unwrap().point();
        assert_eq!(point.date(), Date::from_ymd(2026, 1, 2).unwrap());
        assert_relative_eq!(point.rate(), (0.0075_f64.exp() - 1.0) / 0.25, epsilon = 1e-12);
        assert_relative_eq!(point.rate_increment(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_libor_chain_reuses_previous_point() {
        let evolver = LiborPointEvolver::new(
            EvolverConfig::new(labels()),
            model(0.0),
            curve(),
            1,
            PointSeed::Chain,
        )
        .unwrap();
        let previous_point =
            TimePointSnapshot::new(spot().add_days(90), 0.03, 0.001, 0.004, 0.0).unwrap();
        let previous = EvolutionState::Point(PointSnapshot::new(
            EvolutionInterval::instant(spot()),
            labels(),
            previous_point,
        ));
        let state = evolver
            .evolve(spot(), spot(), 0.5, &previous, &mut zero_draws())
            .unwrap();
        let point = state.expect_point().unwrap().point();
        assert_relative_eq!(point.rate(), 0.031, epsilon = 1e-15);
        // zero vol leaves only the chained drift seed
        assert_relative_eq!(point.rate_increment(), 0.5 * 0.004, epsilon = 1e-15);
    }

    #[test]
    fn test_chain_rejects_curve_state() {
        let evolver = ContinuousForwardPointEvolver::new(
            EvolverConfig::new(labels()),
            model(0.1),
            curve(),
            2,
            PointSeed::Chain,
        )
        .unwrap();
        let mut draws = zero_draws();
        let err = evolver
            .evolve(spot(), spot(), 0.25, &curve_state(0.1), &mut draws)
            .unwrap_err();
        assert_eq!(err, DynamicsError::snapshot_mismatch("point", "curve"));
        assert_eq!(draws.draws_served(), 0);
    }

    #[test]
    fn test_continuous_forward_zero_shock_is_half_variance_drift() {
        let evolver = ContinuousForwardPointEvolver::new(
            EvolverConfig::new(labels()),
            model(0.2),
            curve(),
            2,
            PointSeed::Estimator,
        )
        .unwrap();
        let mut draws = zero_draws();
        let state = evolver
            .evolve(spot(), spot(), 0.25, &curve_state(0.2), &mut draws)
            .unwrap();
        let point = state.expect_point().unwrap().point();
        assert_relative_eq!(point.rate(), 0.03, epsilon = 1e-15);
        assert_relative_eq!(point.rate_increment(), 0.25 * point.drift_seed(), epsilon = 1e-15);
        assert!(point.drift_seed() > 0.0);
        assert_eq!(draws.draws_served(), 1);
    }

    #[test]
    fn test_rejects_zero_offset() {
        assert!(LiborPointEvolver::new(
            EvolverConfig::new(labels()),
            model(0.1),
            curve(),
            0,
            PointSeed::Estimator,
        )
        .is_err());
    }

    #[test]
    fn test_default_seed_is_estimator() {
        assert_eq!(PointSeed::default(), PointSeed::Estimator);
        let evolver = LiborPointEvolver::new(
            EvolverConfig::new(labels()),
            model(0.1),
            curve(),
            1,
            PointSeed::default(),
        )
        .unwrap();
        assert_eq!(evolver.seed(), PointSeed::Estimator);
    }

    #[test]
    fn test_chain_keeps_fixing_date() {
        let config = EvolverConfig::new(labels());
        let seeded =
            LiborPointEvolver::new(config.clone(), model(0.2), curve(), 4, PointSeed::Estimator)
                .unwrap();
        let chained =
            LiborPointEvolver::new(config, model(0.2), curve(), 4, PointSeed::Chain).unwrap();
        let mut draws =
            SequenceFactorGenerator::cycling(vec![FactorVector::from_vec(vec![0.7])]).unwrap();

        let first = seeded
            .evolve(spot(), spot(), 0.25, &curve_state(0.2), &mut draws)
            .unwrap();
        let first_point = *first.expect_point().unwrap().point();
        let fixing = Date::from_ymd(2026, 1, 2).unwrap();
        assert_eq!(first_point.date(), fixing);

        let view = first.interval().end();
        let second = chained
            .evolve(spot(), view, 0.25, &first, &mut draws)
            .unwrap();
        let second_point = second.expect_point().unwrap().point();
        assert_eq!(second_point.date(), fixing);
        assert_eq!(second_point.rate(), first_point.evolved_rate());
        assert_eq!(second_point.drift_seed(), first_point.drift_seed());
        assert_eq!(second.interval().start(), view);
    }

    #[test]
    fn test_chain_past_fixing_fails_without_drawing() {
        let evolver = ContinuousForwardPointEvolver::new(
            EvolverConfig::new(labels()),
            model(0.1),
            curve(),
            1,
            PointSeed::Chain,
        )
        .unwrap();
        let fixing = Date::from_ymd(2025, 4, 2).unwrap();
        let previous = EvolutionState::Point(PointSnapshot::new(
            EvolutionInterval::instant(spot()),
            labels(),
            TimePointSnapshot::new(fixing, 0.03, 0.0, 0.0, 0.0).unwrap(),
        ));
        let mut draws = zero_draws();
        for view in [fixing, fixing.add_days(1)] {
            let err = evolver
                .evolve(spot(), view, 0.25, &previous, &mut draws)
                .unwrap_err();
            assert!(matches!(err, DynamicsError::InvalidInput { .. }));
        }
        assert_eq!(draws.draws_served(), 0);
    }

    #[test]
    fn test_estimator_seed_uses_snapshot_model() {
        // the evolver's own model is flat at zero; the snapshot's is not
        let evolver = ContinuousForwardPointEvolver::new(
            EvolverConfig::new(labels()),
            model(0.0),
            curve(),
            2,
            PointSeed::Estimator,
        )
        .unwrap();
        let state = evolver
            .evolve(spot(), spot(), 0.25, &curve_state(0.2), &mut zero_draws())
            .unwrap();
        assert!(state.expect_point().unwrap().point().drift_seed() > 0.0);
    }

    #[test]
    fn test_rejects_snapshot_model_on_other_tenor() {
        let evolver = LiborPointEvolver::new(
            EvolverConfig::new(labels()),
            model(0.1),
            curve(),
            2,
            PointSeed::Estimator,
        )
        .unwrap();
        let six_month = VolatilityModel::builder(spot(), labels().forward)
            .tenor(Tenor::months(6).unwrap())
            .factor(FlatVolatilitySurface::new(0.1).unwrap())
            .build()
            .unwrap();
        let state: EvolutionState =
            CurveSnapshot::initial(labels(), curve(), Arc::new(six_month)).into();
        let mut draws = zero_draws();
        let err = evolver
            .evolve(spot(), spot(), 0.25, &state, &mut draws)
            .unwrap_err();
        assert!(matches!(err, DynamicsError::InvalidInput { .. }));
        assert_eq!(draws.draws_served(), 0);
    }

    #[test]
    fn test_continuous_forward_increment_with_shock() {
        let vols = [0.2, 0.1];
        let z = [1.5, -0.7];
        let two_factor = Arc::new(
            VolatilityModel::builder(spot(), labels().forward)
                .tenor(Tenor::months(3).unwrap())
                .factor(FlatVolatilitySurface::new(vols[0]).unwrap())
                .factor(FlatVolatilitySurface::new(vols[1]).unwrap())
                .build()
                .unwrap(),
        );
        let evolver = ContinuousForwardPointEvolver::new(
            EvolverConfig::new(labels()),
            Arc::clone(&two_factor),
            curve(),
            1,
            PointSeed::Estimator,
        )
        .unwrap();
        let state: EvolutionState = CurveSnapshot::initial(labels(), curve(), two_factor).into();
        let mut draws = SequenceFactorGenerator::repeating(FactorVector::from_vec(z.to_vec())).unwrap();

        // off the tenor grid, so the loading is linear around the target
        let view = Date::from_ymd(2025, 2, 17).unwrap();
        let dt = 0.25;
        let next = evolver.evolve(spot(), view, dt, &state, &mut draws).unwrap();
        let point = next.expect_point().unwrap().point();

        let tenor = Tenor::months(3).unwrap();
        let dc = DayCountConvention::Act360;
        let target = tenor.advance(view).unwrap();
        let first_roll = tenor.advance(spot()).unwrap();
        let second_roll = tenor.advance_n(spot(), 2).unwrap();
        let tau0 = dc.year_fraction(spot(), first_roll);
        let tau1 = dc.year_fraction(first_roll, second_roll);
        let libor = (0.0075_f64.exp() - 1.0) / 0.25;
        let conversion = |tau: f64| tau * libor / (1.0 + tau * libor);
        let weight = (dc.year_fraction(spot(), target) - tau0) / tau1;

        let sigma: Vec<f64> = vols
            .iter()
            .map(|v| v * conversion(tau0) + weight * v * conversion(tau1))
            .collect();
        let slope: Vec<f64> = vols.iter().map(|v| v * conversion(tau1) / tau1).collect();
        let dot = |a: &[f64], b: &[f64]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f64>();

        let half_variance_slope = dot(&sigma, &slope);
        let expected = dt * half_variance_slope + dt.sqrt() * dot(&slope, &z[..]);

        assert_eq!(point.date(), target);
        assert_relative_eq!(point.rate(), 0.03, epsilon = 1e-15);
        assert_relative_eq!(point.drift_seed(), half_variance_slope, epsilon = 1e-12);
        assert_relative_eq!(point.rate_increment(), expected, epsilon = 1e-12);
        assert_relative_eq!(point.volatility_norm(), dot(&sigma, &sigma), epsilon = 1e-15);
    }
}
