//! Core data model for delegation and treasury aggregation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::amount::BigAmount;
use crate::conviction::LockedPeriod;
use crate::error::{Error, Result};

/// A chain account, already normalized to the canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Numeric identifier of a governance track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(transparent)]
pub struct TrackId(pub u16);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delegation edge as returned by the indexer, before validation.
///
/// `balance` is kept as whatever JSON the indexer sent so that one bad edge
/// fails on conversion instead of failing the whole response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDelegation {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub balance: Value,
    #[serde(default)]
    pub lock_period: Option<u32>,
}

impl RawDelegation {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        balance: impl Into<String>,
        lock_period: Option<u32>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            balance: Value::String(balance.into()),
            lock_period,
        }
    }
}

/// One validated delegation edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DelegationRecord {
    pub from: Address,
    pub to: Address,
    #[cfg_attr(feature = "typescript", ts(type = "string"))]
    pub balance: BigAmount,
    pub lock_period: Option<u32>,
}

impl TryFrom<&RawDelegation> for DelegationRecord {
    type Error = Error;

    fn try_from(raw: &RawDelegation) -> Result<Self> {
        Ok(Self {
            from: Address::from(raw.from.as_str()),
            to: Address::from(raw.to.as_str()),
            balance: parse_balance(&raw.balance)?,
            lock_period: raw.lock_period,
        })
    }
}

/// Decimal strings and non-negative JSON integers are amounts; anything else
/// is not.
fn parse_balance(balance: &Value) -> Result<BigAmount> {
    match balance {
        Value::String(s) => s.parse(),
        Value::Number(n) => n
            .as_u64()
            .map(BigAmount::from)
            .ok_or_else(|| Error::InvalidAmount(n.to_string())),
        other => Err(Error::InvalidAmount(other.to_string())),
    }
}

/// Delegation state of the queried addresses on one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum DelegationStatus {
    /// No edge touches the queried addresses
    Undelegated,
    /// A queried address delegates out
    Delegated,
    /// A queried address receives from elsewhere
    ReceivedDelegation,
}

/// Per-track delegation summary for a set of addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct TrackDelegationSummary {
    pub track: TrackId,
    pub active_proposals_count: u32,
    pub status: BTreeSet<DelegationStatus>,
    pub received_delegation_count: u32,
    pub delegations: Vec<DelegationRecord>,
}

/// Voting power attributed to a single edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct VotingPowerRecord {
    pub from: Address,
    pub to: Address,
    #[cfg_attr(feature = "typescript", ts(type = "string"))]
    pub capital: BigAmount,
    #[cfg_attr(feature = "typescript", ts(type = "number"))]
    pub locked_period: LockedPeriod,
    #[cfg_attr(feature = "typescript", ts(type = "string"))]
    pub voting_power: BigAmount,
}

/// All edges grouped under one delegator or delegatee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DelegateAggregate {
    pub address: Address,
    pub count: u32,
    pub records: Vec<VotingPowerRecord>,
}

impl DelegateAggregate {
    /// Start an aggregate from its first record.
    pub fn first(address: Address, record: VotingPowerRecord) -> Self {
        Self {
            address,
            count: 1,
            records: vec![record],
        }
    }

    /// Add a further record.
    pub fn push(&mut self, record: VotingPowerRecord) {
        self.count += 1;
        self.records.push(record);
    }
}

/// Unit of work that failed and was left out of a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedUnit {
    /// Which unit failed, e.g. `track:12` or `chain:asset_hub`
    pub unit: String,
    /// Why it failed
    pub reason: String,
}

impl FailedUnit {
    pub fn new(unit: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            unit: unit.into(),
            reason: reason.to_string(),
        }
    }
}

/// One balance reading in a history window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub date: NaiveDate,
    pub balance: BigAmount,
}

/// Balance readings for one chain over one monthly window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlyBalanceSeries(pub Vec<BalanceEntry>);

impl MonthlyBalanceSeries {
    /// Placeholder for a window with no transfer activity.
    pub fn placeholder(start: NaiveDate) -> Self {
        Self(vec![BalanceEntry {
            date: start,
            balance: BigAmount::zero(),
        }])
    }

    /// The latest-dated entry; the earliest listed wins ties.
    pub fn latest(&self) -> Option<&BalanceEntry> {
        self.0
            .iter()
            .reduce(|best, entry| if entry.date > best.date { entry } else { best })
    }

    pub fn entries(&self) -> &[BalanceEntry] {
        &self.0
    }
}

/// Month-name keyed treasury tally (`"january"` .. `"december"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthlyTreasuryTally(BTreeMap<String, BigAmount>);

impl MonthlyTreasuryTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an amount into a month bucket.
    pub fn add(&mut self, month: impl Into<String>, amount: &BigAmount) {
        *self.0.entry(month.into()).or_default() += amount;
    }

    pub fn get(&self, month: &str) -> Option<&BigAmount> {
        self.0.get(month)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BigAmount)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_raw_delegation_validation() {
        let raw = RawDelegation::new("A", "B", "500", Some(2));
        let record = DelegationRecord::try_from(&raw).unwrap();
        assert_eq!(record.balance, BigAmount::from(500u32));
        assert_eq!(record.from, Address::from("A"));

        let bad = RawDelegation::new("A", "B", "5e2", None);
        assert!(matches!(DelegationRecord::try_from(&bad), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn test_raw_delegation_wire_shape() {
        let raw: RawDelegation = serde_json::from_str(
            r#"{"from": "A", "to": "B", "balance": "10", "lockPeriod": null}"#,
        )
        .unwrap();
        assert_eq!(raw.lock_period, None);

        let raw: RawDelegation =
            serde_json::from_str(r#"{"from": "A", "to": "B", "balance": "10"}"#).unwrap();
        assert_eq!(raw.lock_period, None);
    }

    #[test]
    fn test_raw_delegation_bad_balance_fails_on_conversion() {
        let edges: Vec<RawDelegation> = serde_json::from_str(
            r#"[
                {"from": "A", "to": "B", "balance": null},
                {"from": "C", "to": "B"},
                {"from": "D", "to": "B", "balance": -3},
                {"from": "E", "to": "B", "balance": 1.5},
                {"from": "F", "to": "B", "balance": 42}
            ]"#,
        )
        .unwrap();

        for edge in &edges[..4] {
            assert!(
                matches!(DelegationRecord::try_from(edge), Err(Error::InvalidAmount(_))),
                "accepted {:?}",
                edge.balance
            );
        }
        let record = DelegationRecord::try_from(&edges[4]).unwrap();
        assert_eq!(record.balance, BigAmount::from(42u32));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&DelegationStatus::ReceivedDelegation).unwrap();
        assert_eq!(json, "\"received_delegation\"");
    }

    #[test]
    fn test_series_latest_entry() {
        let series = MonthlyBalanceSeries(vec![
            BalanceEntry { date: date(2024, 3, 1), balance: BigAmount::from(5u32) },
            BalanceEntry { date: date(2024, 3, 9), balance: BigAmount::from(7u32) },
            BalanceEntry { date: date(2024, 3, 4), balance: BigAmount::from(9u32) },
        ]);
        assert_eq!(series.latest().unwrap().balance, BigAmount::from(7u32));
        assert!(MonthlyBalanceSeries::default().latest().is_none());
    }

    #[test]
    fn test_tally_accumulates() {
        let mut tally = MonthlyTreasuryTally::new();
        tally.add("march", &BigAmount::from(10u32));
        tally.add("march", &BigAmount::from(5u32));
        tally.add("april", &BigAmount::from(1u32));
        assert_eq!(tally.get("march"), Some(&BigAmount::from(15u32)));
        assert_eq!(tally.len(), 2);

        let json = serde_json::to_value(&tally).unwrap();
        assert_eq!(json["march"], "15");
    }
}
