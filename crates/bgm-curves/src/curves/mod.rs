//! Concrete curve variants.
//!
//! - [`FlatRateCurve`]: constant continuously-compounded rate
//! - [`PillarRateCurve`]: bootstrapped discount-factor pillars
//! - [`FittedCurve`] / [`FittedRateCurve`]: spline-backed curves from refits

mod fitted;
mod flat;
mod pillar;

pub use fitted::{FittedCurve, FittedRateCurve};
pub use flat::FlatRateCurve;
pub use pillar::{PillarRateCurve, PillarRateCurveBuilder};
