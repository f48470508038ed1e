use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid amount `{0}`: expected digits with up to two decimal places")]
pub struct InvalidAmount(pub String);

/// Monetary amount in centavos. On the wire it is a decimal string matching
/// `^\d+(\.\d{1,2})?$`, so it never passes through floating point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountMinor(i64);

impl AmountMinor {
    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub fn minor(&self) -> i64 {
        self.0
    }

    pub fn parse(raw: &str) -> Result<Self, InvalidAmount> {
        let invalid = || InvalidAmount(raw.to_string());

        let (whole, fraction) = match raw.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (raw, None),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let cents = match fraction {
            None => 0,
            Some(fraction) => {
                if fraction.is_empty()
                    || fraction.len() > 2
                    || !fraction.bytes().all(|b| b.is_ascii_digit())
                {
                    return Err(invalid());
                }
                let value: i64 = fraction.parse().map_err(|_| invalid())?;
                if fraction.len() == 1 { value * 10 } else { value }
            }
        };

        let units: i64 = whole.parse().map_err(|_| invalid())?;
        units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl Display for AmountMinor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for AmountMinor {
    type Err = InvalidAmount;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for AmountMinor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AmountMinor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
