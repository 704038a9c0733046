//! Tenors (`1W`, `3M`, `1Y`) used to step along the forward ladder.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Date;
use crate::error::{CoreError, CoreResult};

/// Unit of a [`Tenor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TenorUnit {
    /// Calendar days.
    Days,
    /// Weeks of seven calendar days.
    Weeks,
    /// Calendar months, end-of-month clamped.
    Months,
    /// Calendar years.
    Years,
}

impl TenorUnit {
    fn suffix(self) -> char {
        match self {
            TenorUnit::Days => 'D',
            TenorUnit::Weeks => 'W',
            TenorUnit::Months => 'M',
            TenorUnit::Years => 'Y',
        }
    }
}

/// A strictly positive period such as `3M`.
///
/// Serialized as its string form, so configuration files can say
/// `"forward_tenor": "3M"`.
///
/// ```rust
/// use bgm_core::types::{Date, Tenor};
///
/// let tenor: Tenor = "6M".parse().unwrap();
/// let start = Date::from_ymd(2025, 3, 31).unwrap();
/// assert_eq!(tenor.advance_n(start, 2).unwrap(), Date::from_ymd(2026, 3, 31).unwrap());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tenor {
    count: u32,
    unit: TenorUnit,
}

impl Tenor {
    /// The 3M tenor of quarterly LIBOR fixings.
    pub const THREE_MONTHS: Tenor = Tenor {
        count: 3,
        unit: TenorUnit::Months,
    };

    /// Creates a tenor. The count must be positive.
    pub fn new(count: u32, unit: TenorUnit) -> CoreResult<Self> {
        if count == 0 {
            return Err(CoreError::invalid_tenor("tenor count must be positive"));
        }
        Ok(Self { count, unit })
    }

    /// `n` months.
    pub fn months(n: u32) -> CoreResult<Self> {
        Self::new(n, TenorUnit::Months)
    }

    /// `n` years.
    pub fn years(n: u32) -> CoreResult<Self> {
        Self::new(n, TenorUnit::Years)
    }

    /// Parses strings like `"3M"`, `"1y"`, `"2W"` or `"10D"`.
    pub fn parse(s: &str) -> CoreResult<Self> {
        let s = s.trim();
        let Some(last) = s.chars().last() else {
            return Err(CoreError::invalid_tenor("empty tenor"));
        };
        let unit = match last.to_ascii_uppercase() {
            'D' => TenorUnit::Days,
            'W' => TenorUnit::Weeks,
            'M' => TenorUnit::Months,
            'Y' => TenorUnit::Years,
            other => {
                return Err(CoreError::invalid_tenor(format!(
                    "unknown unit '{other}' in '{s}'"
                )))
            }
        };
        let digits = &s[..s.len() - last.len_utf8()];
        let count = digits
            .parse::<u32>()
            .map_err(|_| CoreError::invalid_tenor(format!("bad count in '{s}'")))?;
        Self::new(count, unit)
    }

    /// Number of units.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The unit.
    #[must_use]
    pub fn unit(&self) -> TenorUnit {
        self.unit
    }

    /// Moves `date` forward by one tenor.
    pub fn advance(&self, date: Date) -> CoreResult<Date> {
        self.advance_n(date, 1)
    }

    /// Moves `date` by `n` tenors in one step.
    ///
    /// Month and year tenors are applied from the original date, so a
    /// 31 January start with `1M` gives 30 April for `n = 3`, not 28 April.
    pub fn advance_n(&self, date: Date, n: i32) -> CoreResult<Date> {
        let total = i64::from(self.count) * i64::from(n);
        match self.unit {
            TenorUnit::Days => Ok(date.add_days(total)),
            TenorUnit::Weeks => Ok(date.add_days(total * 7)),
            TenorUnit::Months => date.add_months(checked_i32(total)?),
            TenorUnit::Years => date.add_months(checked_i32(total * 12)?),
        }
    }

    /// Nominal length in years (`3M` = 0.25, `1W` = 7/365).
    #[must_use]
    pub fn nominal_years(&self) -> f64 {
        let count = f64::from(self.count);
        match self.unit {
            TenorUnit::Days => count / 365.0,
            TenorUnit::Weeks => count * 7.0 / 365.0,
            TenorUnit::Months => count / 12.0,
            TenorUnit::Years => count,
        }
    }
}

fn checked_i32(value: i64) -> CoreResult<i32> {
    i32::try_from(value).map_err(|_| CoreError::invalid_tenor(format!("offset {value} overflows")))
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.suffix())
    }
}

impl FromStr for Tenor {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Tenor {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Tenor> for String {
    fn from(tenor: Tenor) -> Self {
        tenor.to_string()
    }
}
