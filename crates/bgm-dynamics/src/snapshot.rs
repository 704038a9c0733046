//! Immutable per-node and per-time value records.

use bgm_core::Date;

use crate::error::{DynamicsError, DynamicsResult};

/// Field values of a [`TenorPointSnapshot`], before validation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TenorPointFields {
    /// LIBOR fixing at the node.
    pub libor: f64,
    /// LIBOR increment over the step.
    pub libor_increment: f64,
    /// Discount factor from the view date to the node.
    pub discount_factor: f64,
    /// Discount-factor increment over the step.
    pub discount_factor_increment: f64,
    /// Instantaneous continuous forward at the node.
    pub continuous_forward: f64,
    /// Continuous-forward increment over the step.
    pub continuous_forward_increment: f64,
    /// Continuously-compounded spot rate to the node.
    pub spot_rate: f64,
    /// Spot-rate increment over the step.
    pub spot_rate_increment: f64,
    /// Squared norm of the LIBOR factor loadings.
    pub lognormal_libor_volatility_norm: f64,
    /// Squared norm of the continuous-forward factor loadings.
    pub continuous_forward_volatility_norm: f64,
}

/// Curve state and increments at one ladder node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TenorPointSnapshot {
    date: Date,
    fields: TenorPointFields,
}

impl TenorPointSnapshot {
    /// Validates and freezes the node values.
    ///
    /// # Errors
    ///
    /// Fails on the first non-finite field, in declaration order.
    pub fn new(date: Date, fields: TenorPointFields) -> DynamicsResult<Self> {
        let named = [
            ("libor", fields.libor),
            ("libor_increment", fields.libor_increment),
            ("discount_factor", fields.discount_factor),
            ("discount_factor_increment", fields.discount_factor_increment),
            ("continuous_forward", fields.continuous_forward),
            ("continuous_forward_increment", fields.continuous_forward_increment),
            ("spot_rate", fields.spot_rate),
            ("spot_rate_increment", fields.spot_rate_increment),
            ("lognormal_libor_volatility_norm", fields.lognormal_libor_volatility_norm),
            ("continuous_forward_volatility_norm", fields.continuous_forward_volatility_norm),
        ];
        ensure_all_finite(&named)?;
        Ok(Self { date, fields })
    }

    /// Node date.
    pub fn date(&self) -> Date {
        self.date
    }

    /// All values at once.
    pub fn fields(&self) -> &TenorPointFields {
        &self.fields
    }

    /// LIBOR fixing.
    pub fn libor(&self) -> f64 {
        self.fields.libor
    }

    /// LIBOR increment.
    pub fn libor_increment(&self) -> f64 {
        self.fields.libor_increment
    }

    /// Discount factor.
    pub fn discount_factor(&self) -> f64 {
        self.fields.discount_factor
    }

    /// Discount-factor increment.
    pub fn discount_factor_increment(&self) -> f64 {
        self.fields.discount_factor_increment
    }

    /// Instantaneous continuous forward.
    pub fn continuous_forward(&self) -> f64 {
        self.fields.continuous_forward
    }

    /// Continuous-forward increment.
    pub fn continuous_forward_increment(&self) -> f64 {
        self.fields.continuous_forward_increment
    }

    /// Spot rate.
    pub fn spot_rate(&self) -> f64 {
        self.fields.spot_rate
    }

    /// Spot-rate increment.
    pub fn spot_rate_increment(&self) -> f64 {
        self.fields.spot_rate_increment
    }

    /// `‖λ‖²`.
    pub fn lognormal_libor_volatility_norm(&self) -> f64 {
        self.fields.lognormal_libor_volatility_norm
    }

    /// `‖Σ‖²`.
    pub fn continuous_forward_volatility_norm(&self) -> f64 {
        self.fields.continuous_forward_volatility_norm
    }
}

/// A single evolved rate at one absolute date, as carried between calls of
/// the point evolvers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePointSnapshot {
    date: Date,
    rate: f64,
    rate_increment: f64,
    drift_seed: f64,
    volatility_norm: f64,
}

impl TimePointSnapshot {
    /// Validates and freezes the point values.
    ///
    /// # Errors
    ///
    /// Fails on the first non-finite value.
    pub fn new(
        date: Date,
        rate: f64,
        rate_increment: f64,
        drift_seed: f64,
        volatility_norm: f64,
    ) -> DynamicsResult<Self> {
        ensure_all_finite(&[
            ("rate", rate),
            ("rate_increment", rate_increment),
            ("drift_seed", drift_seed),
            ("volatility_norm", volatility_norm),
        ])?;
        Ok(Self {
            date,
            rate,
            rate_increment,
            drift_seed,
            volatility_norm,
        })
    }

    /// Date of the rate.
    pub fn date(&self) -> Date {
        self.date
    }

    /// Rate at the start of the step.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Increment over the step.
    pub fn rate_increment(&self) -> f64 {
        self.rate_increment
    }

    /// Rate after the step.
    pub fn evolved_rate(&self) -> f64 {
        self.rate + self.rate_increment
    }

    /// Deterministic drift input reused by chained steps.
    pub fn drift_seed(&self) -> f64 {
        self.drift_seed
    }

    /// Squared norm of the factor loadings.
    pub fn volatility_norm(&self) -> f64 {
        self.volatility_norm
    }
}

fn ensure_all_finite(named: &[(&'static str, f64)]) -> DynamicsResult<()> {
    match named.iter().find(|(_, value)| !value.is_finite()) {
        Some(&(field, value)) => Err(DynamicsError::InvalidField { field, value }),
        None => Ok(()),
    }
}
