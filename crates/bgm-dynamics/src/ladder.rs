//! Structure-of-arrays view of a tenor ladder.

use bgm_core::Date;
use bgm_curves::traits::curve_time;

use crate::error::{DynamicsError, DynamicsResult};
use crate::snapshot::TenorPointSnapshot;
use crate::state::Quantity;

/// Index-aligned arrays of every [`TenorPointSnapshot`] field, one entry per
/// ladder node, in node order.
#[derive(Debug, Clone, PartialEq)]
pub struct TenorLadderSequence {
    dates: Vec<Date>,
    libors: Vec<f64>,
    libor_increments: Vec<f64>,
    discount_factors: Vec<f64>,
    discount_factor_increments: Vec<f64>,
    continuous_forwards: Vec<f64>,
    continuous_forward_increments: Vec<f64>,
    spot_rates: Vec<f64>,
    spot_rate_increments: Vec<f64>,
    lognormal_libor_volatility_norms: Vec<f64>,
    continuous_forward_volatility_norms: Vec<f64>,
}

impl TenorLadderSequence {
    /// Transposes the snapshots.
    ///
    /// # Errors
    ///
    /// Fails when `points` is empty or its dates are not strictly increasing.
    pub fn from_snapshots(points: &[TenorPointSnapshot]) -> DynamicsResult<Self> {
        if points.is_empty() {
            return Err(DynamicsError::invalid_input("tenor ladder has no nodes"));
        }
        if let Some(pair) = points.windows(2).find(|pair| pair[1].date() <= pair[0].date()) {
            return Err(DynamicsError::invalid_input(format!(
                "ladder dates out of order: {} then {}",
                pair[0].date(),
                pair[1].date()
            )));
        }

        let column = |f: fn(&TenorPointSnapshot) -> f64| points.iter().map(f).collect::<Vec<_>>();
        Ok(Self {
            dates: points.iter().map(TenorPointSnapshot::date).collect(),
            libors: column(TenorPointSnapshot::libor),
            libor_increments: column(TenorPointSnapshot::libor_increment),
            discount_factors: column(TenorPointSnapshot::discount_factor),
            discount_factor_increments: column(TenorPointSnapshot::discount_factor_increment),
            continuous_forwards: column(TenorPointSnapshot::continuous_forward),
            continuous_forward_increments: column(TenorPointSnapshot::continuous_forward_increment),
            spot_rates: column(TenorPointSnapshot::spot_rate),
            spot_rate_increments: column(TenorPointSnapshot::spot_rate_increment),
            lognormal_libor_volatility_norms: column(TenorPointSnapshot::lognormal_libor_volatility_norm),
            continuous_forward_volatility_norms: column(
                TenorPointSnapshot::continuous_forward_volatility_norm,
            ),
        })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always false for a constructed ladder.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Node dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Node times in years (ACT/365F) from `reference`.
    pub fn times_from(&self, reference: Date) -> Vec<f64> {
        self.dates.iter().map(|&date| curve_time(reference, date)).collect()
    }

    /// LIBOR fixings.
    pub fn libors(&self) -> &[f64] {
        &self.libors
    }

    /// LIBOR increments.
    pub fn libor_increments(&self) -> &[f64] {
        &self.libor_increments
    }

    /// Discount factors.
    pub fn discount_factors(&self) -> &[f64] {
        &self.discount_factors
    }

    /// Discount-factor increments.
    pub fn discount_factor_increments(&self) -> &[f64] {
        &self.discount_factor_increments
    }

    /// Continuous forwards.
    pub fn continuous_forwards(&self) -> &[f64] {
        &self.continuous_forwards
    }

    /// Continuous-forward increments.
    pub fn continuous_forward_increments(&self) -> &[f64] {
        &self.continuous_forward_increments
    }

    /// Spot rates.
    pub fn spot_rates(&self) -> &[f64] {
        &self.spot_rates
    }

    /// Spot-rate increments.
    pub fn spot_rate_increments(&self) -> &[f64] {
        &self.spot_rate_increments
    }

    /// `‖λ‖²` per node.
    pub fn lognormal_libor_volatility_norms(&self) -> &[f64] {
        &self.lognormal_libor_volatility_norms
    }

    /// `‖Σ‖²` per node.
    pub fn continuous_forward_volatility_norms(&self) -> &[f64] {
        &self.continuous_forward_volatility_norms
    }

    /// Values to refit for `quantity`: evolved levels (start value plus
    /// increment) for level quantities, raw increments otherwise.
    pub fn series(&self, quantity: Quantity) -> Vec<f64> {
        let (levels, increments) = match quantity.increment() {
            Quantity::LiborIncrement => (&self.libors, &self.libor_increments),
            Quantity::DiscountFactorIncrement => {
                (&self.discount_factors, &self.discount_factor_increments)
            }
            Quantity::ContinuousForwardIncrement => {
                (&self.continuous_forwards, &self.continuous_forward_increments)
            }
            _ => (&self.spot_rates, &self.spot_rate_increments),
        };
        if quantity.is_increment() {
            increments.clone()
        } else {
            levels.iter().zip(increments).map(|(level, delta)| level + delta).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::TenorPointFields;
    use proptest::prelude::*;

    fn point(day: i64, scale: f64) -> TenorPointSnapshot {
        let date = Date::from_ymd(2025, 1, 2).unwrap().add_days(day);
        TenorPointSnapshot::new(
            date,
            TenorPointFields {
                libor: scale,
                libor_increment: 2.0 * scale,
                discount_factor: 3.0 * scale,
                discount_factor_increment: 4.0 * scale,
                continuous_forward: 5.0 * scale,
                continuous_forward_increment: 6.0 * scale,
                spot_rate: 7.0 * scale,
                spot_rate_increment: 8.0 * scale,
                lognormal_libor_volatility_norm: 9.0 * scale,
                continuous_forward_volatility_norm: 10.0 * scale,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_series_levels_and_increments() {
        let ladder = TenorLadderSequence::from_snapshots(&[point(90, 1.0), point(181, 2.0)]).unwrap();
        assert_eq!(ladder.series(Quantity::Libor), vec![3.0, 6.0]);
        assert_eq!(ladder.series(Quantity::LiborIncrement), vec![2.0, 4.0]);
        assert_eq!(ladder.series(Quantity::DiscountFactor), vec![7.0, 14.0]);
        assert_eq!(ladder.series(Quantity::SpotRateIncrement), vec![8.0, 16.0]);
        assert_eq!(ladder.series(Quantity::ContinuousForward), vec![11.0, 22.0]);
    }

    #[test]
    fn test_times_from_reference() {
        let ladder = TenorLadderSequence::from_snapshots(&[point(73, 1.0)]).unwrap();
        let reference = Date::from_ymd(2025, 1, 2).unwrap();
        assert_eq!(ladder.times_from(reference), vec![0.2]);
    }

    #[test]
    fn test_rejects_empty_and_unordered() {
        assert!(TenorLadderSequence::from_snapshots(&[]).is_err());
        assert!(TenorLadderSequence::from_snapshots(&[point(90, 1.0), point(90, 2.0)]).is_err());
        assert!(TenorLadderSequence::from_snapshots(&[point(181, 1.0), point(90, 2.0)]).is_err());
    }

    proptest! {
        #[test]
        fn prop_arrays_index_aligned(scales in prop::collection::vec(0.001f64..1.0, 1..40)) {
            let points: Vec<_> = scales
                .iter()
                .enumerate()
                .map(|(i, &scale)| point(91 * (i as i64 + 1), scale))
                .collect();
            let ladder = TenorLadderSequence::from_snapshots(&points).unwrap();

            prop_assert_eq!(ladder.len(), points.len());
            prop_assert_eq!(ladder.continuous_forward_volatility_norms().len(), points.len());
            for (i, p) in points.iter().enumerate() {
                prop_assert_eq!(ladder.dates()[i], p.date());
                prop_assert_eq!(ladder.libors()[i], p.libor());
                prop_assert_eq!(ladder.discount_factor_increments()[i], p.discount_factor_increment());
                prop_assert_eq!(ladder.spot_rates()[i], p.spot_rate());
                prop_assert_eq!(
                    ladder.lognormal_libor_volatility_norms()[i],
                    p.lognormal_libor_volatility_norm()
                );
            }
        }
    }
}
