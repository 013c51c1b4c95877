//! Utility types for protocol serialization.

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// An amount in an asset's smallest unit, carried on the wire as a decimal string.
///
/// Only plain ASCII digits are accepted: no sign, no whitespace, no fraction, no exponent.
/// The value must fit in `u64`, which covers every Solana token and lamport amount.
///
/// ```rust
/// use x402_types::proto::util::TokenAmount;
///
/// let amount: TokenAmount = serde_json::from_str("\"1000000\"").unwrap();
/// assert_eq!(amount.inner(), 1_000_000);
/// assert!(serde_json::from_str::<TokenAmount>("\"1.5\"").is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TokenAmount(u64);

impl TokenAmount {
    /// Returns the inner `u64` value.
    pub fn inner(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenAmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must contain only decimal digits, got {0:?}")]
    NotDigits(String),
    #[error("amount {0} does not fit in 64 bits")]
    Overflow(String),
}

impl FromStr for TokenAmount {
    type Err = TokenAmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(TokenAmountError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TokenAmountError::NotDigits(s.to_string()));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| TokenAmountError::Overflow(s.to_string()))
    }
}

impl From<u64> for TokenAmount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<TokenAmount> for u64 {
    fn from(value: TokenAmount) -> Self {
        value.0
    }
}

impl Display for TokenAmount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for TokenAmount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<TokenAmount>().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_digits() {
        assert_eq!("0".parse::<TokenAmount>().unwrap().inner(), 0);
        assert_eq!(
            "18446744073709551615".parse::<TokenAmount>().unwrap().inner(),
            u64::MAX
        );
    }

    #[test]
    fn test_rejects_non_integer_forms() {
        for bad in ["", "+1", "-1", " 1", "1.0", "1e6", "0x10"] {
            assert!(bad.parse::<TokenAmount>().is_err(), "{bad:?} parsed");
        }
        assert_eq!(
            "18446744073709551616".parse::<TokenAmount>(),
            Err(TokenAmountError::Overflow("18446744073709551616".to_string()))
        );
    }

    #[test]
    fn test_number_is_not_accepted() {
        assert!(serde_json::from_str::<TokenAmount>("1000").is_err());
    }
}
