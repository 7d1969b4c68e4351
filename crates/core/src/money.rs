//! Money amounts in minor currency units (piastres for EGP).

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Non-negative amount in minor units (1/100 of the major unit).
///
/// Serialized as a JSON number in major units (`20.5`); deserialized from a
/// number or a decimal string (`"20.50"`).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "f64", try_from = "MoneyRepr")]
pub struct Money(u64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    pub fn minor_units(self) -> u64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Parse a decimal amount such as `10`, `10.5` or `10.50`.
    pub fn parse(input: &str) -> DomainResult<Self> {
        let s = input.trim();
        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        let digits_ok = !whole.is_empty()
            && whole.bytes().all(|b| b.is_ascii_digit())
            && frac.len() <= 2
            && frac.bytes().all(|b| b.is_ascii_digit());
        if !digits_ok {
            return Err(DomainError::validation(
                "invalid_price",
                format!("not a valid amount: {input:?}"),
            ));
        }

        let whole: u64 = whole
            .parse()
            .map_err(|_| DomainError::validation("invalid_price", "amount too large"))?;
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().unwrap_or(0) * 10,
            _ => frac.parse::<u64>().unwrap_or(0),
        };

        whole
            .checked_mul(100)
            .and_then(|m| m.checked_add(frac))
            .map(Money)
            .ok_or_else(|| DomainError::validation("invalid_price", "amount too large"))
    }

    /// Convert a major-unit float, rounding to the nearest minor unit.
    pub fn from_major(value: f64) -> DomainResult<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(DomainError::validation(
                "invalid_price",
                "amount must be a non-negative number",
            ));
        }
        let minor = (value * 100.0).round();
        if minor > u64::MAX as f64 {
            return Err(DomainError::validation("invalid_price", "amount too large"));
        }
        Ok(Money(minor as u64))
    }

    pub fn as_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(u64::from(quantity)).map(Money)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl From<Money> for f64 {
    fn from(value: Money) -> Self {
        value.as_major()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MoneyRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<MoneyRepr> for Money {
    type Error = DomainError;

    fn try_from(value: MoneyRepr) -> Result<Self, Self::Error> {
        match value {
            MoneyRepr::Number(n) => Money::from_major(n),
            MoneyRepr::Text(s) => Money::parse(&s),
        }
    }
}
