//! Fixed point money amounts.
//!
//! All ledger arithmetic is done in whole cents so that debits and credits
//! always sum exactly. Floating point only shows up at the edges, e.g. for
//! chart values and financial ratios.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::Error;

/// An amount of money in cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl Money {
    /// Zero dollars.
    pub const ZERO: Money = Money(0);

    /// The largest amount accepted from a form or produced by a line total:
    /// one trillion dollars.
    ///
    /// Keeping single amounts this far below `i64::MAX` means a document or
    /// journal entry can hold many maximum lines before a total overflows,
    /// and [Money::try_sum] catches the rest.
    pub const MAX: Money = Money(100_000_000_000_000);

    /// Create an amount from a number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create an amount from a whole number of dollars.
    pub const fn from_dollars(dollars: i64) -> Self {
        Self(dollars * 100)
    }

    /// The amount in cents.
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// The amount in dollars as a float, for display and charting only.
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Multiply the amount by a whole quantity.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if the result overflows.
    /// Returns [Error::InvalidAmount] if the result is larger than [Money::MAX].
    pub fn times(self, quantity: i64) -> Result<Self, Error> {
        self.0
            .checked_mul(quantity)
            .map(Self)
            .filter(|product| product.abs() <= Self::MAX)
            .ok_or_else(|| Error::InvalidAmount(format!("{self} × {quantity}")))
    }

    /// Add two amounts.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if the sum overflows.
    pub fn checked_add(self, rhs: Self) -> Result<Self, Error> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or_else(|| Error::InvalidAmount(format!("{self} + {rhs}")))
    }

    /// Subtract `rhs` from the amount.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if the difference overflows.
    pub fn checked_sub(self, rhs: Self) -> Result<Self, Error> {
        self.0
            .checked_sub(rhs.0)
            .map(Self)
            .ok_or_else(|| Error::InvalidAmount(format!("{self} - {rhs}")))
    }

    /// Sum amounts that came from user input.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] as soon as the running total overflows.
    pub fn try_sum(amounts: impl IntoIterator<Item = Money>) -> Result<Self, Error> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |total, amount| total.checked_add(amount))
    }

    /// Take `bps` basis points (hundredths of a percent) of the amount,
    /// rounding half away from zero.
    ///
    /// For example, 15% tax is 1500 basis points.
    pub fn percent_bps(self, bps: u32) -> Self {
        let numerator = self.0 as i128 * bps as i128;
        let half = 5_000i128;
        let rounded = if numerator >= 0 {
            (numerator + half) / 10_000
        } else {
            (numerator - half) / 10_000
        };

        Self(rounded as i64)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();

        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

impl FromStr for Money {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidAmount(s.to_owned());

        let trimmed = s.trim();
        let (is_negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let unsigned = unsigned.strip_prefix('$').unwrap_or(unsigned).replace(',', "");

        if unsigned.is_empty() {
            return Err(invalid());
        }

        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (unsigned.as_str(), ""),
        };

        if fraction.len() > 2
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
            || (whole.is_empty() && fraction.is_empty())
        {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .filter(|cents| *cents <= Self::MAX.0)
            .ok_or_else(invalid)?;

        Ok(Self(if is_negative { -cents } else { cents }))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |total, amount| total + amount)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Self)
    }
}

/// Parse an optional form field, treating a blank field as zero.
pub fn parse_optional_amount(raw: &str) -> Result<Money, Error> {
    if raw.trim().is_empty() {
        Ok(Money::ZERO)
    } else {
        raw.parse()
    }
}


#[cfg(test)]
mod arithmetic_tests {
    use crate::{Error, money::Money};

    #[test]
    fn display_pads_cents() {
        assert_eq!(Money::from_cents(1205).to_string(), "12.05");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::ZERO.to_string(), "0.00");
    }

    #[test]
    fn percent_rounds_half_away_from_zero() {
        // 15% of $0.10 is 1.5 cents.
        assert_eq!(Money::from_cents(10).percent_bps(1500), Money::from_cents(2));
        assert_eq!(
            Money::from_cents(-10).percent_bps(1500),
            Money::from_cents(-2)
        );
        assert_eq!(
            Money::from_cents(9999).percent_bps(1250),
            Money::from_cents(1250)
        );
    }

    #[test]
    fn times_detects_overflow() {
        assert!(Money::from_cents(i64::MAX).times(2).is_err());
        assert!(Money::MAX.times(2).is_err());
        assert_eq!(Money::MAX.times(1), Ok(Money::MAX));
        assert_eq!(Money::from_cents(250).times(3), Ok(Money::from_cents(750)));
    }

    #[test]
    fn try_sum_reports_overflow_instead_of_wrapping() {
        let amounts = [Money::from_cents(i64::MAX), Money::from_cents(i64::MAX)];

        assert!(matches!(Money::try_sum(amounts), Err(Error::InvalidAmount(_))));
        assert_eq!(
            Money::try_sum([Money::from_cents(1), Money::from_cents(2)]),
            Ok(Money::from_cents(3))
        );
    }

    #[test]
    fn checked_sub_detects_overflow() {
        assert!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)).is_err());
        assert_eq!(
            Money::from_cents(5).checked_sub(Money::from_cents(7)),
            Ok(Money::from_cents(-2))
        );
    }

    #[test]
    fn sums_references() {
        let amounts = [Money::from_cents(1), Money::from_cents(2)];

        assert_eq!(amounts.iter().sum::<Money>(), Money::from_cents(3));
    }
}
