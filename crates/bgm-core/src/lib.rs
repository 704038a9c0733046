//! # BGM Core
//!
//! Core types shared by every crate of the BGM curve evolution engine.
//!
//! - **Types**: [`Date`], [`Tenor`], [`CurveLabel`] and [`EvolutionLabels`]
//! - **Day Count Conventions**: year fractions between dates
//! - **Errors**: [`CoreError`] for invalid dates, tenors and labels
//!
//! ## Example
//!
//! ```rust
//! use bgm_core::prelude::*;
//!
//! let spot = Date::from_ymd(2025, 1, 15).unwrap();
//! let tenor = Tenor::parse("3M").unwrap();
//! let reset = tenor.advance(spot).unwrap();
//! assert_eq!(reset, Date::from_ymd(2025, 4, 15).unwrap());
//!
//! let tau = DayCountConvention::Act360.year_fraction(spot, reset);
//! assert!(tau > 0.24 && tau < 0.26);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::doc_markdown)]

pub mod daycounts;
pub mod error;
pub mod types;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::daycounts::DayCountConvention;
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::types::{CurveLabel, Date, EvolutionLabels, Tenor, TenorUnit};
}

// Re-export commonly used types at crate root
pub use daycounts::DayCountConvention;
pub use error::{CoreError, CoreResult};
pub use types::{CurveLabel, Date, EvolutionLabels, Tenor, TenorUnit};
