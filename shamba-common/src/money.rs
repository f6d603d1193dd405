//! Currency amounts as minor-unit integers
//!
//! Payment amounts carry exactly two fractional digits. They are held as an
//! integer count of the smallest subunit (cents) so that ledger keys compare
//! exactly and the escrow contract receives the same integer it stores.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Amount parse failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseAmountError {
    #[error("empty amount string")]
    Empty,

    #[error("amount must have exactly two fractional digits: {0}")]
    FractionDigits(String),

    #[error("invalid amount: {0}")]
    Invalid(String),

    #[error("amount out of range: {0}")]
    OutOfRange(String),
}

/// A non-negative currency amount with two fractional digits, stored in
/// minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// Construct from a minor-unit count. Returns None for negative values.
    pub fn from_minor(minor: i64) -> Option<Self> {
        (minor >= 0).then_some(Self(minor))
    }

    /// Minor-unit count (amount x 100), the on-chain representation.
    pub fn minor_units(&self) -> i64 {
        self.0
    }

    /// Major-unit value for JSON responses.
    pub fn as_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parse an extracted amount string such as "5,000.00" or "1200.50".
    ///
    /// Grouping commas are stripped; exactly two fractional digits are
    /// required. Anything else is rejected, never defaulted.
    pub fn parse(s: &str) -> Result<Self, ParseAmountError> {
        let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
        if cleaned.is_empty() {
            return Err(ParseAmountError::Empty);
        }

        let (whole, frac) = cleaned
            .split_once('.')
            .ok_or_else(|| ParseAmountError::FractionDigits(s.to_string()))?;
        if frac.len() != 2 {
            return Err(ParseAmountError::FractionDigits(s.to_string()));
        }
        if whole.is_empty()
            || !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(ParseAmountError::Invalid(s.to_string()));
        }

        let whole: i64 = whole
            .parse()
            .map_err(|_| ParseAmountError::OutOfRange(s.to_string()))?;
        let frac: i64 = frac.parse().expect("two ascii digits");
        whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(frac))
            .map(Self)
            .ok_or_else(|| ParseAmountError::OutOfRange(s.to_string()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() || value < 0.0 {
            return Err(de::Error::custom("amount must be a non-negative number"));
        }
        let minor = (value * 100.0).round();
        if (minor - value * 100.0).abs() > 1e-6 {
            return Err(de::Error::custom(
                "amount must have at most two fractional digits",
            ));
        }
        Ok(Self(minor as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_grouping_commas() {
        let with_commas = Amount::parse("1,200.50").unwrap();
        let without = Amount::parse("1200.50").unwrap();
        assert_eq!(with_commas, without);
        assert_eq!(with_commas.minor_units(), 120050);
    }

    #[test]
    fn parse_requires_two_fraction_digits() {
        assert!(matches!(
            Amount::parse("1200.5"),
            Err(ParseAmountError::FractionDigits(_))
        ));
        assert!(matches!(
            Amount::parse("1200"),
            Err(ParseAmountError::FractionDigits(_))
        ));
        assert!(matches!(
            Amount::parse("1200.500"),
            Err(ParseAmountError::FractionDigits(_))
        ));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Amount::parse("").is_err());
        assert!(Amount::parse("abc.de").is_err());
        assert!(Amount::parse("-5.00").is_err());
        assert!(Amount::parse(".50").is_err());
    }

    #[test]
    fn display_round_trips() {
        let amount = Amount::parse("5,000.00").unwrap();
        assert_eq!(amount.to_string(), "5000.00");
        assert_eq!(Amount::parse("0.05").unwrap().to_string(), "0.05");
    }

    #[test]
    fn minor_units_follow_contract_convention() {
        assert_eq!(Amount::parse("5000.00").unwrap().minor_units(), 500000);
        assert_eq!(Amount::parse("0.01").unwrap().minor_units(), 1);
    }

    #[test]
    fn from_minor_rejects_negative() {
        assert!(Amount::from_minor(-1).is_none());
        assert_eq!(Amount::from_minor(100).unwrap().as_major(), 1.0);
    }
}
