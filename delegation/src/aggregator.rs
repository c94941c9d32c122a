//! Delegator / delegatee aggregation with conviction-weighted voting power.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use votepower_core::{
    voting_power, Address, BigAmount, DelegateAggregate, DelegationRecord, FailedUnit,
    LockedPeriod, RawDelegation, VotingPowerRecord,
};

/// Grouped delegation analytics for one batch of edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelegationAnalytics {
    /// Aggregates keyed by receiving address
    pub by_delegatee: BTreeMap<Address, DelegateAggregate>,
    /// Aggregates keyed by delegating address
    pub by_delegator: BTreeMap<Address, DelegateAggregate>,
    /// Sum of delegated balances
    pub total_capital: BigAmount,
    /// Sum of voting power
    pub total_votes_balance: BigAmount,
    /// Distinct delegatees
    pub total_delegates: usize,
    /// Distinct delegators
    pub total_delegators: usize,
    /// Edges left out because their balance did not parse
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<FailedUnit>,
}

/// Accumulates edges into [`DelegationAnalytics`].
///
/// Owned by a single caller for one batch; never shared across tasks.
#[derive(Debug, Default)]
pub struct DelegateAggregator {
    by_delegatee: BTreeMap<Address, DelegateAggregate>,
    by_delegator: BTreeMap<Address, DelegateAggregate>,
    total_capital: BigAmount,
    total_votes_balance: BigAmount,
    skipped: Vec<FailedUnit>,
}

impl DelegateAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate validated edges.
    pub fn aggregate(records: &[DelegationRecord]) -> DelegationAnalytics {
        let mut aggregator = Self::new();
        for record in records {
            aggregator.push(record);
        }
        aggregator.finish()
    }

    /// Aggregate unvalidated edges, skipping any with a malformed balance.
    pub fn aggregate_raw(raw: &[RawDelegation]) -> DelegationAnalytics {
        let mut aggregator = Self::new();
        for (index, delegation) in raw.iter().enumerate() {
            aggregator.push_raw(index, delegation);
        }
        aggregator.finish()
    }

    /// Add one unvalidated edge.
    pub fn push_raw(&mut self, index: usize, raw: &RawDelegation) {
        match DelegationRecord::try_from(raw) {
            Ok(record) => self.push(&record),
            Err(e) => {
                warn!(index, from = %raw.from, error = %e, "Skipping delegation with malformed balance");
                self.skipped
                    .push(FailedUnit::new(format!("delegation:{}", index), e));
            }
        }
    }

    /// Add one edge.
    pub fn push(&mut self, record: &DelegationRecord) {
        let power = voting_power(&record.balance, record.lock_period);
        let entry = VotingPowerRecord {
            from: record.from.clone(),
            to: record.to.clone(),
            capital: record.balance.clone(),
            locked_period: LockedPeriod::from_lock(record.lock_period),
            voting_power: power.clone(),
        };

        self.total_capital += &record.balance;
        self.total_votes_balance += &power;

        upsert(&mut self.by_delegatee, &record.to, entry.clone());
        upsert(&mut self.by_delegator, &record.from, entry);
    }

    /// Finish the batch.
    pub fn finish(self) -> DelegationAnalytics {
        debug!(
            delegatees = self.by_delegatee.len(),
            delegators = self.by_delegator.len(),
            skipped = self.skipped.len(),
            "Delegation aggregation finished"
        );

        DelegationAnalytics {
            total_delegates: self.by_delegatee.len(),
            total_delegators: self.by_delegator.len(),
            by_delegatee: self.by_delegatee,
            by_delegator: self.by_delegator,
            total_capital: self.total_capital,
            total_votes_balance: self.total_votes_balance,
            skipped: self.skipped,
        }
    }
}

fn upsert(map: &mut BTreeMap<Address, DelegateAggregate>, key: &Address, record: VotingPowerRecord) {
    match map.get_mut(key) {
        Some(aggregate) => aggregate.push(record),
        None => {
            map.insert(key.clone(), DelegateAggregate::first(key.clone(), record));
        }
    }
}
