//! Integration test: pillar curve, estimators and refitted curve views.
//!
//! Pillars are a 3M-spaced discount curve from a 2025-01-02 spot with a
//! gently upward-sloping zero rate.

use std::sync::Arc;

use approx::assert_relative_eq;
use bgm_core::{CurveLabel, Date, Tenor};
use bgm_curves::curves::{FittedCurve, FittedRateCurve, PillarRateCurve};
use bgm_curves::traits::curve_time;
use bgm_curves::RateCurve;
use bgm_math::spline::{BoundaryCondition, SplineFitRequest, SplineFitter};

fn spot() -> Date {
    Date::from_ymd(2025, 1, 2).unwrap()
}

fn zero_rate(t: f64) -> f64 {
    0.03 + 0.004 * t
}

fn pillar_curve() -> PillarRateCurve {
    let tenor = Tenor::months(3).unwrap();
    let mut builder = PillarRateCurve::builder(spot());
    for i in 1..=20 {
        let date = tenor.advance_n(spot(), i).unwrap();
        let t = curve_time(spot(), date);
        builder = builder.add_pillar(date, (-zero_rate(t) * t).exp());
    }
    builder.build().unwrap()
}

#[test]
fn test_estimator_matches_curve_forward() {
    let curve = pillar_curve();
    let tenor = Tenor::months(3).unwrap();
    let label = CurveLabel::parse("USD.LIBOR3M").unwrap();
    let estimator = curve.forward_rate_estimator(tenor, &label).unwrap();

    let fixing = spot().add_years(2).unwrap();
    let t = curve.year_fraction(fixing);
    let expected = curve.forward_rate(t, t + 0.25).unwrap();
    assert_relative_eq!(estimator.forward_rate_at(fixing).unwrap(), expected, epsilon = 1e-14);

    // forwards increase with an upward-sloping zero curve
    let early = estimator.forward_rate(0.5).unwrap();
    let late = estimator.forward_rate(4.0).unwrap();
    assert!(late > early);
}

#[test]
fn test_refit_round_trip_preserves_curve() {
    let source = pillar_curve();
    let tenor = Tenor::months(3).unwrap();
    let label = CurveLabel::parse("USD.LIBOR3M").unwrap();
    let estimator = source.forward_rate_estimator(tenor, &label).unwrap();

    let times: Vec<f64> = (1..=16).map(|i| 0.25 * f64::from(i)).collect();
    let fit = |name: &str, values: Vec<f64>| {
        let request = SplineFitRequest::new(name, times.clone(), values)
            .with_boundary(BoundaryCondition::Natural);
        Arc::new(FittedCurve::new(label.clone(), spot(), SplineFitter.fit(&request).unwrap()))
    };

    let dfs = times.iter().map(|&t| source.discount_factor(t).unwrap()).collect();
    let cfs = times.iter().map(|&t| source.instantaneous_forward(t).unwrap()).collect();
    let libors = times.iter().map(|&t| estimator.forward_rate(t).unwrap()).collect();

    let view = FittedRateCurve::new(tenor, fit("df", dfs), fit("cf", cfs), fit("libor", libors))
        .unwrap();

    for t in [0.5, 1.3, 2.75, 3.9] {
        assert_relative_eq!(
            view.discount_factor(t).unwrap(),
            source.discount_factor(t).unwrap(),
            epsilon = 2e-4
        );
    }

    let refit_estimator = view.forward_rate_estimator(tenor, &label).unwrap();
    assert_relative_eq!(
        refit_estimator.forward_rate(2.0).unwrap(),
        estimator.forward_rate(2.0).unwrap(),
        epsilon = 1e-12
    );
}
