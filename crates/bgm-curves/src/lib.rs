//! # BGM Curves
//!
//! Rate curves consumed and produced by curve evolution.
//!
//! - **Curve Trait**: [`RateCurve`], discount factors and forwards on an ACT/365F time axis
//! - **Estimators**: [`ForwardRateEstimator`] for tenor fixings
//! - **Curve Types**: flat, pillar (bootstrapped) and spline-fitted curves
//!
//! ## Quick Start
//!
//! ```rust
//! use bgm_core::{CurveLabel, Date, Tenor};
//! use bgm_curves::prelude::*;
//!
//! let spot = Date::from_ymd(2025, 1, 2).unwrap();
//! let curve = FlatRateCurve::new(spot, 0.03);
//! let label = CurveLabel::parse("USD.LIBOR3M").unwrap();
//! let estimator = curve.forward_rate_estimator(Tenor::months(3).unwrap(), &label).unwrap();
//! let libor = estimator.forward_rate(1.0).unwrap();
//! assert!(libor > 0.03);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]

pub mod curves;
pub mod error;
pub mod estimator;
pub mod traits;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::curves::{
        FittedCurve, FittedRateCurve, FlatRateCurve, PillarRateCurve, PillarRateCurveBuilder,
    };
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::estimator::CurveForwardEstimator;
    pub use crate::traits::{curve_time, ForwardRateEstimator, RateCurve};
}

pub use error::{CurveError, CurveResult};
pub use traits::{ForwardRateEstimator, RateCurve};
