//! Conviction-weighted voting power.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::amount::BigAmount;

/// Divisor applied to delegations carrying no conviction lock.
pub const NO_CONVICTION_DIVISOR: u32 = 10;

/// Reported lock period of a delegation.
///
/// A delegation without a conviction lock is reported as `0.1`. That value
/// is a display marker only: the arithmetic rule in [`voting_power`]
/// divides by [`NO_CONVICTION_DIVISOR`] instead of multiplying by a float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockedPeriod {
    /// Explicit lock period, including an explicit zero
    Locked(u32),
    /// No lock period on the edge
    NoConviction,
}

impl LockedPeriod {
    /// Marker reported for [`LockedPeriod::NoConviction`].
    pub const NO_CONVICTION_MARKER: f64 = 0.1;

    /// Map an optional on-chain lock period.
    pub fn from_lock(lock_period: Option<u32>) -> Self {
        match lock_period {
            Some(period) => Self::Locked(period),
            None => Self::NoConviction,
        }
    }

    /// Numeric value as reported to analytics consumers.
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Locked(period) => f64::from(*period),
            Self::NoConviction => Self::NO_CONVICTION_MARKER,
        }
    }
}

impl Serialize for LockedPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Locked(period) => serializer.serialize_u32(*period),
            Self::NoConviction => serializer.serialize_f64(Self::NO_CONVICTION_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for LockedPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PeriodVisitor;

        impl<'de> Visitor<'de> for PeriodVisitor {
            type Value = LockedPeriod;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a lock period integer or 0.1")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<LockedPeriod, E> {
                u32::try_from(v)
                    .map(LockedPeriod::Locked)
                    .map_err(|_| E::custom(format!("lock period out of range: {v}")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<LockedPeriod, E> {
                u32::try_from(v)
                    .map(LockedPeriod::Locked)
                    .map_err(|_| E::custom(format!("lock period out of range: {v}")))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<LockedPeriod, E> {
                if (v - LockedPeriod::NO_CONVICTION_MARKER).abs() < f64::EPSILON {
                    Ok(LockedPeriod::NoConviction)
                } else {
                    Err(E::custom(format!("unexpected lock period: {v}")))
                }
            }

            fn visit_unit<E: de::Error>(self) -> Result<LockedPeriod, E> {
                Ok(LockedPeriod::NoConviction)
            }
        }

        deserializer.deserialize_any(PeriodVisitor)
    }
}

/// Voting power carried by a delegation edge.
///
/// A non-zero lock multiplies the balance; an absent or zero lock divides
/// it by ten, truncating.
pub fn voting_power(balance: &BigAmount, lock_period: Option<u32>) -> BigAmount {
    match lock_period {
        Some(period) if period != 0 => balance.mul_u32(period),
        _ => no_conviction_discount(balance),
    }
}

fn no_conviction_discount(balance: &BigAmount) -> BigAmount {
    balance
        .checked_div(NO_CONVICTION_DIVISOR)
        .unwrap_or_else(BigAmount::zero)
}
