//! # BGM Math
//!
//! Numerical building blocks for curve evolution:
//!
//! - **Finite differences**: closure-based derivatives and divided differences
//! - **Spline fitting**: the spline-fit service used to refit evolved curves
//! - **Factors**: multivariate standard-normal draws behind [`FactorGenerator`]
//!
//! ## Example
//!
//! ```rust
//! use bgm_math::prelude::*;
//!
//! let fd = FiniteDifference::new(DifferenceScheme::Central, 1e-5);
//! let slope: MathResult<f64> = fd.derivative(|x| Ok(x * x), 3.0);
//! assert!((slope.unwrap() - 6.0).abs() < 1e-8);
//!
//! let request = SplineFitRequest::new("libor", vec![0.25, 0.5, 0.75], vec![0.03, 0.031, 0.032]);
//! let spline = SplineFitter::default().fit(&request).unwrap();
//! assert!((spline.value(0.5) - 0.031).abs() < 1e-12);
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
#![allow(clippy::many_single_char_names)]
#![allow(clippy::float_cmp)]

pub mod error;
pub mod factors;
pub mod finite_difference;
pub mod interpolation;
pub mod spline;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::factors::{
        FactorGenerator, FactorVector, GaussianFactorGenerator, SequenceFactorGenerator,
    };
    pub use crate::finite_difference::{
        derivative, divided_difference, DifferenceScheme, FiniteDifference,
    };
    pub use crate::interpolation::Interpolator;
    pub use crate::spline::{
        BoundaryCondition, FittedSpline, SegmentBasis, SplineFitRequest, SplineFitter,
    };
}

pub use error::{MathError, MathResult};
