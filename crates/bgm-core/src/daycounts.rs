//! Day count conventions.
//!
//! Year fractions here are plain `f64`: every consumer feeds them straight
//! into rate and volatility arithmetic.
//!
//! - [`DayCountConvention::Act360`]: money market accrual (LIBOR fixings)
//! - [`DayCountConvention::Act365Fixed`]: curve time axis
//! - [`DayCountConvention::Thirty360`]: 30/360 bond basis
//!
//! ```rust
//! use bgm_core::daycounts::DayCountConvention;
//! use bgm_core::types::Date;
//!
//! let start = Date::from_ymd(2025, 1, 15).unwrap();
//! let end = Date::from_ymd(2025, 7, 15).unwrap();
//! assert_eq!(DayCountConvention::Act360.day_count(start, end), 181);
//! assert_eq!(DayCountConvention::Thirty360.year_fraction(start, end), 0.5);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Date;

/// Supported day count conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DayCountConvention {
    /// Actual/360.
    #[default]
    Act360,
    /// Actual/365 Fixed.
    Act365Fixed,
    /// 30/360 US bond basis.
    Thirty360,
}

impl DayCountConvention {
    /// Market name of the convention.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Act360 => "ACT/360",
            Self::Act365Fixed => "ACT/365F",
            Self::Thirty360 => "30/360",
        }
    }

    /// Days between two dates under the convention. Negative when `end < start`.
    #[must_use]
    pub fn day_count(&self, start: Date, end: Date) -> i64 {
        match self {
            Self::Act360 | Self::Act365Fixed => start.days_between(&end),
            Self::Thirty360 => thirty_360_days(start, end),
        }
    }

    /// Year fraction between two dates. Negative when `end < start`.
    #[must_use]
    pub fn year_fraction(&self, start: Date, end: Date) -> f64 {
        let days = self.day_count(start, end) as f64;
        match self {
            Self::Act360 | Self::Thirty360 => days / 360.0,
            Self::Act365Fixed => days / 365.0,
        }
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn thirty_360_days(start: Date, end: Date) -> i64 {
    let (y1, m1, mut d1) = (
        i64::from(start.year()),
        i64::from(start.month()),
        i64::from(start.day()),
    );
    let (y2, m2, mut d2) = (
        i64::from(end.year()),
        i64::from(end.month()),
        i64::from(end.day()),
    );

    if d1 == 31 {
        d1 = 30;
    }
    if d2 == 31 && d1 >= 30 {
        d2 = 30;
    }

    360 * (y2 - y1) + 30 * (m2 - m1) + (d2 - d1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_act360() {
        let yf = DayCountConvention::Act360.year_fraction(d(2025, 1, 1), d(2025, 4, 1));
        assert_relative_eq!(yf, 90.0 / 360.0);
    }

    #[test]
    fn test_act365_fixed_leap_year() {
        let yf = DayCountConvention::Act365Fixed.year_fraction(d(2024, 1, 1), d(2025, 1, 1));
        assert_relative_eq!(yf, 366.0 / 365.0);
    }

    #[test]
    fn test_thirty360_month_ends() {
        let dc = DayCountConvention::Thirty360;
        assert_eq!(dc.day_count(d(2025, 1, 31), d(2025, 3, 31)), 60);
        assert_eq!(dc.day_count(d(2025, 1, 30), d(2025, 2, 28)), 28);
        assert_eq!(dc.day_count(d(2025, 1, 15), d(2025, 3, 31)), 76);
    }

    #[test]
    fn test_negative_fraction() {
        let yf = DayCountConvention::Act365Fixed.year_fraction(d(2025, 2, 1), d(2025, 1, 1));
        assert!(yf < 0.0);
    }

    #[test]
    fn test_serde_and_display() {
        let json = serde_json::to_string(&DayCountConvention::Act365Fixed).unwrap();
        assert_eq!(json, "\"Act365Fixed\"");
        assert_eq!(DayCountConvention::Act360.to_string(), "ACT/360");
    }
}
