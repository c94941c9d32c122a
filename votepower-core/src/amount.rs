//! Arbitrary-precision token amounts.
//!
//! On-chain balances routinely exceed `u64`, so every balance, capital and
//! voting-power figure is a [`BigAmount`]. Arithmetic is exact and never
//! overflows into a fixed-width type.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use std::str::FromStr;

use crate::error::Error;

/// Non-negative integer amount parsed from a decimal string.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BigAmount(BigUint);

impl BigAmount {
    /// The zero amount.
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Check for zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Multiply by a small factor, such as a conviction multiplier.
    pub fn mul_u32(&self, factor: u32) -> Self {
        Self(&self.0 * factor)
    }

    /// Truncating division. Returns `None` for a zero divisor.
    pub fn checked_div(&self, divisor: u32) -> Option<Self> {
        if divisor == 0 {
            return None;
        }
        Some(Self(&self.0 / divisor))
    }

    /// Borrow the underlying integer.
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }
}

impl FromStr for BigAmount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // BigUint's own parser tolerates '+' and '_', which are not amounts.
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAmount(s.to_string()));
        }
        BigUint::from_str(s)
            .map(Self)
            .map_err(|_| Error::InvalidAmount(s.to_string()))
    }
}

impl fmt::Display for BigAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BigAmount {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u32> for BigAmount {
    fn from(value: u32) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for BigAmount {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl Add for BigAmount {
    type Output = BigAmount;

    fn add(self, rhs: BigAmount) -> BigAmount {
        Self(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a BigAmount> for &'a BigAmount {
    type Output = BigAmount;

    fn add(self, rhs: &'a BigAmount) -> BigAmount {
        BigAmount(&self.0 + &rhs.0)
    }
}

impl AddAssign<&BigAmount> for BigAmount {
    fn add_assign(&mut self, rhs: &BigAmount) {
        self.0 += &rhs.0;
    }
}

impl<'a> Mul<&'a BigAmount> for &'a BigAmount {
    type Output = BigAmount;

    fn mul(self, rhs: &'a BigAmount) -> BigAmount {
        BigAmount(&self.0 * &rhs.0)
    }
}

impl Sum for BigAmount {
    fn sum<I: Iterator<Item = BigAmount>>(iter: I) -> Self {
        iter.fold(BigAmount::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a BigAmount> for BigAmount {
    fn sum<I: Iterator<Item = &'a BigAmount>>(iter: I) -> Self {
        iter.fold(BigAmount::zero(), |mut acc, x| {
            acc += x;
            acc
        })
    }
}

impl Serialize for BigAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BigAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl<'de> Visitor<'de> for AmountVisitor {
            type Value = BigAmount;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or decimal string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<BigAmount, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<BigAmount, E> {
                Ok(BigAmount::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<BigAmount, E> {
                u64::try_from(v)
                    .map(BigAmount::from)
                    .map_err(|_| E::custom(Error::InvalidAmount(v.to_string())))
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}
