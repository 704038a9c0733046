//! # BGM Dynamics
//!
//! Discrete-time curve evolution under the multi-factor lognormal LIBOR
//! Market Model.
//!
//! - **Volatility**: [`VolatilityModel`] over per-factor [`VolatilitySurface`]s
//! - **Evolvers**: [`CurveStateEvolver`] refits the whole curve each step;
//!   [`LiborPointEvolver`] and [`ContinuousForwardPointEvolver`] follow one rate
//! - **State**: immutable [`CurveSnapshot`]s chained step to step, wrapped in
//!   [`EvolutionState`] together with single-point states
//! - **Configuration**: [`EvolverConfig`], loadable from JSON
//!
//! Randomness is never owned by an evolver: each `evolve` call takes a
//! `&mut dyn FactorGenerator` and consumes exactly one draw from it.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use bgm_core::{CurveLabel, Date, EvolutionLabels, Tenor};
//! use bgm_curves::curves::FlatRateCurve;
//! use bgm_dynamics::prelude::*;
//! use bgm_math::factors::GaussianFactorGenerator;
//!
//! let spot = Date::from_ymd(2025, 1, 2).unwrap();
//! let labels = EvolutionLabels::new(
//!     CurveLabel::parse("USD.SOFR").unwrap(),
//!     CurveLabel::parse("USD.LIBOR3M").unwrap(),
//! );
//! let model = VolatilityModel::builder(spot, labels.forward.clone())
//!     .tenor(Tenor::months(3).unwrap())
//!     .factor(AbcdVolatilitySurface::new(0.05, 0.1, 1.0, 0.1).unwrap())
//!     .factor(FlatVolatilitySurface::new(0.03).unwrap())
//!     .build()
//!     .unwrap();
//! let evolver = CurveStateEvolver::new(EvolverConfig::new(labels.clone()).with_tenor_count(12)).unwrap();
//!
//! let mut state: EvolutionState = CurveSnapshot::initial(
//!     labels.clone(),
//!     Arc::new(FlatRateCurve::new(spot, 0.03)),
//!     Arc::new(model),
//! )
//! .into();
//! let mut generator = GaussianFactorGenerator::new(2, 42).unwrap();
//! let mut view = spot;
//! for _ in 0..4 {
//!     state = evolver.evolve(spot, view, 0.25, &state, &mut generator).unwrap();
//!     view = state.interval().end();
//! }
//!
//! let snapshot = state.expect_curve().unwrap();
//! assert_eq!(snapshot.history().count(), 5);
//! let libor = snapshot.level(&labels.forward, Quantity::Libor).unwrap();
//! assert!(libor.value(1.0).unwrap().is_finite());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::float_cmp)]

pub mod config;
pub mod error;
pub mod evolver;
pub mod ladder;
pub mod point;
pub mod snapshot;
pub mod state;
pub mod volatility;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{DifferenceConfig, EvolverConfig, SplineConfig, Validate};
    pub use crate::error::{ConfigError, DynamicsError, DynamicsResult};
    pub use crate::evolver::{CurveStateEvolver, StateEvolver};
    pub use crate::ladder::TenorLadderSequence;
    pub use crate::point::{ContinuousForwardPointEvolver, LiborPointEvolver, PointSeed};
    pub use crate::snapshot::{TenorPointFields, TenorPointSnapshot, TimePointSnapshot};
    pub use crate::state::{
        CurveIncrement, CurveSnapshot, EvolutionInterval, EvolutionState, KeyedRecord,
        PointSnapshot, Quantity,
    };
    pub use crate::volatility::{
        AbcdVolatilitySurface, FlatVolatilitySurface, GridVolatilitySurface, VolatilityModel,
        VolatilitySurface,
    };
}

pub use config::EvolverConfig;
pub use error::{DynamicsError, DynamicsResult};
pub use evolver::{CurveStateEvolver, StateEvolver};
pub use point::{ContinuousForwardPointEvolver, LiborPointEvolver};
pub use state::{CurveSnapshot, EvolutionState};
pub use volatility::{VolatilityModel, VolatilitySurface};
