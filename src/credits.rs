//! Fixed-point credit amounts with 2 decimal places of precision.
//!
//! Uses `rust_decimal` internally with scale enforcement so balance
//! arithmetic never accumulates floating-point error.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// A signed credit amount that maintains exactly 2 decimal places.
///
/// Balances and stakes are internal bookkeeping numbers, not real money,
/// but they still deserve exact arithmetic. Values may be negative: a
/// negative balance represents an outstanding debt.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use wager_ledger::Credits;
///
/// let stake = Credits::from_str("100").unwrap();
/// assert_eq!(stake.to_string(), "100.00");
/// assert_eq!((-stake).to_string(), "-100.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Credits(Decimal);

impl Credits {
    /// The number of decimal places to maintain.
    pub const SCALE: u32 = 2;

    /// Zero value.
    pub const ZERO: Self = Credits(Decimal::ZERO);

    /// Creates a new `Credits` from a `Decimal`, normalizing to 2 decimal places.
    pub fn new(value: Decimal) -> Self {
        let mut normalized = value;
        normalized.rescale(Self::SCALE);
        Credits(normalized)
    }

    /// Returns `true` if this value is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns `true` if this value is strictly negative (a debt).
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Absolute value, used when describing a delta as a credit or debit.
    pub fn abs(&self) -> Self {
        Credits::new(self.0.abs())
    }
}

impl From<i64> for Credits {
    fn from(value: i64) -> Self {
        Credits::new(Decimal::from(value))
    }
}

impl FromStr for Credits {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decimal = Decimal::from_str(trimmed)?;
        Ok(Credits::new(decimal))
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Credits {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Credits::new(self.0 + rhs.0)
    }
}

impl AddAssign for Credits {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
        self.0.rescale(Self::SCALE);
    }
}

impl Sub for Credits {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Credits::new(self.0 - rhs.0)
    }
}

impl SubAssign for Credits {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
        self.0.rescale(Self::SCALE);
    }
}

impl Neg for Credits {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Credits::new(-self.0)
    }
}

impl Sum for Credits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Credits::ZERO, |acc, c| acc + c)
    }
}

impl Serialize for Credits {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{:.2}", self.0))
    }
}

impl<'de> Deserialize<'de> for Credits {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Credits::from_str(&s).map_err(serde::de::Error::custom)
    }
}
