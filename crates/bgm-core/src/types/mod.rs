//! Domain types for curve evolution.
//!
//! - [`Date`]: Calendar date for financial calculations
//! - [`Tenor`]: Period such as `3M` or `1Y` used to step along a tenor ladder
//! - [`CurveLabel`]: Qualified curve identity (`USD.SOFR`)
//! - [`EvolutionLabels`]: Funding/forward label pair identifying an evolving curve

mod date;
mod label;
mod tenor;

pub use date::Date;
pub use label::{CurveLabel, EvolutionLabels};
pub use tenor::{Tenor, TenorUnit};
