use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, DomainResult};

const PREFIX: &str = "FS-";

/// Human-readable sequential order number (`FS-0001`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct OrderNumber(u64);

impl OrderNumber {
    /// Order number for the `sequence`-th order (1-based).
    pub fn new(sequence: u64) -> DomainResult<Self> {
        if sequence == 0 {
            return Err(DomainError::validation(
                "invalid_order_number",
                "order sequence starts at 1",
            ));
        }
        Ok(Self(sequence))
    }

    pub fn sequence(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{PREFIX}{:04}", self.0)
    }
}

impl core::str::FromStr for OrderNumber {
    type Err = DomainError;

    /// Accepts `FS-` (any case) followed by at least four digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            DomainError::validation("invalid_order_number", format!("not an order number: {s:?}"))
        };

        let s = s.trim();
        let digits = s
            .get(..PREFIX.len())
            .filter(|p| p.eq_ignore_ascii_case(PREFIX))
            .and_then(|_| s.get(PREFIX.len()..))
            .ok_or_else(invalid)?;

        if digits.len() < 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let sequence: u64 = digits.parse().map_err(|_| invalid())?;
        OrderNumber::new(sequence).map_err(|_| invalid())
    }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_four_digit_padding() {
        assert_eq!(OrderNumber::new(1).unwrap().to_string(), "FS-0001");
        assert_eq!(OrderNumber::new(12345).unwrap().to_string(), "FS-12345");
    }

    #[test]
    fn parses_case_insensitively() {
        let n: OrderNumber = "fs-0042".parse().unwrap();
        assert_eq!(n.sequence(), 42);
        assert_eq!(n.to_string(), "FS-0042");
    }

    #[test]
    fn rejects_short_or_malformed_numbers() {
        assert!("FS-001".parse::<OrderNumber>().is_err());
        assert!("FS-00a1".parse::<OrderNumber>().is_err());
        assert!("XX-0001".parse::<OrderNumber>().is_err());
        assert!("FS-0000".parse::<OrderNumber>().is_err());
        assert!("".parse::<OrderNumber>().is_err());
    }

    #[test]
    fn sequence_order_matches_allocation_order() {
        assert!(OrderNumber::new(9).unwrap() < OrderNumber::new(10).unwrap());
    }
}
