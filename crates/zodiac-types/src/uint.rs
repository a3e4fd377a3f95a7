//! Arbitrary-precision unsigned integers.
//!
//! JSON has no large-integer type, so [`Uint`] is written as a string of
//! decimal digits. Plain JSON integers are accepted on input as long as they
//! fit in 64 bits; anything larger has to be quoted.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::address::ParseError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uint(BigUint);

impl Uint {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn into_biguint(self) -> BigUint {
        self.0
    }
}

impl fmt::Display for Uint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Uint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // BigUint also accepts '+' and '_' separators; the wire format does not.
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidUint(s.to_string()));
        }
        s.parse::<BigUint>()
            .map(Self)
            .map_err(|_| ParseError::InvalidUint(s.to_string()))
    }
}

impl From<u64> for Uint {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for Uint {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for Uint {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl Serialize for Uint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Uint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(UintVisitor)
    }
}

struct UintVisitor;

impl<'de> Visitor<'de> for UintVisitor {
    type Value = Uint;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal string or a non-negative integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Uint, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Uint, E> {
        Ok(Uint::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Uint, E> {
        Ok(Uint::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Uint, E> {
        u64::try_from(v)
            .map(Uint::from)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Uint, E> {
        Err(E::custom(format!(
            "{v} is not an exact integer; pass large integers as decimal strings"
        )))
    }
}
