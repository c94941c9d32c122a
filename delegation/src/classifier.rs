//! Track delegation classification.
//!
//! The status scan may stop as soon as both `Delegated` and
//! `ReceivedDelegation` are known. The received count never stops early:
//! it always covers the whole edge list.

use std::collections::{BTreeSet, HashSet};

use votepower_core::{Address, DelegationStatus, TrackDelegationSummary, TrackId};

use crate::fetcher::TrackData;

/// Classifies one track's edges against the queried addresses.
#[derive(Debug, Clone)]
pub struct DelegationClassifier {
    queried: HashSet<Address>,
}

impl DelegationClassifier {
    pub fn new(addresses: impl IntoIterator<Item = Address>) -> Self {
        Self {
            queried: addresses.into_iter().collect(),
        }
    }

    /// Build the summary for one track.
    pub fn classify(&self, track: TrackId, data: TrackData) -> TrackDelegationSummary {
        let TrackData {
            delegations,
            active_proposals_count,
        } = data;

        if delegations.is_empty() {
            return TrackDelegationSummary {
                track,
                active_proposals_count,
                status: BTreeSet::from([DelegationStatus::Undelegated]),
                received_delegation_count: 0,
                delegations,
            };
        }

        let mut status = BTreeSet::new();
        for delegation in &delegations {
            if status.len() >= 2 {
                break;
            }
            if self.queried.contains(&delegation.from) {
                status.insert(DelegationStatus::Delegated);
            } else {
                status.insert(DelegationStatus::ReceivedDelegation);
            }
        }

        let received = delegations
            .iter()
            .filter(|d| !self.queried.contains(&d.from))
            .count();

        TrackDelegationSummary {
            track,
            active_proposals_count,
            status,
            received_delegation_count: u32::try_from(received).unwrap_or(u32::MAX),
            delegations,
        }
    }
}
