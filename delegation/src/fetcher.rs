//! Per-track delegation fetch with isolated failures.
//!
//! One query per eligible track, all in flight together. Each query is
//! bounded by a timeout; a failed or timed-out track is simply absent from
//! the result and reported in `failures`.

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use votepower_core::{Address, DelegationRecord, FailedUnit, FetchConfig, NetworkConfig, TrackId};

use crate::service::{ChainDataService, QueryError, TrackQuery};

/// Validated delegations for one track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackData {
    pub delegations: Vec<DelegationRecord>,
    pub active_proposals_count: u32,
}

/// Everything a fetch produced.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Tracks fetched successfully; unordered
    pub tracks: HashMap<TrackId, TrackData>,
    /// Tracks and records left out, with reasons
    pub failures: Vec<FailedUnit>,
}

/// Issues the per-track queries.
pub struct TrackFetcher {
    service: Arc<dyn ChainDataService>,
    config: FetchConfig,
    limiter: Arc<Semaphore>,
}

impl TrackFetcher {
    /// Create a fetcher with default configuration.
    pub fn new(service: Arc<dyn ChainDataService>) -> Self {
        Self::with_config(service, FetchConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(service: Arc<dyn ChainDataService>, config: FetchConfig) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            service,
            config,
            limiter,
        }
    }

    /// Fetch delegations for `addresses` on every eligible track of `network`.
    pub async fn fetch(
        &self,
        addresses: &[Address],
        network: &NetworkConfig,
        filter: Option<TrackId>,
    ) -> FetchOutcome {
        let mut outcome = FetchOutcome::default();
        if addresses.is_empty() {
            return outcome;
        }

        let run_id = uuid::Uuid::new_v4();
        let tracks = network.delegation_tracks(filter);
        debug!(%run_id, network = %network.name, tracks = tracks.len(), "Fetching track delegations");

        let queries = tracks.into_iter().map(|track| {
            let query = TrackQuery {
                network: network.name.clone(),
                addresses: addresses.to_vec(),
                track,
            };
            async move {
                let result = self.fetch_track(&query).await;
                (query.track, result)
            }
        });

        // Collect every result before touching the outcome.
        let results = join_all(queries).await;

        for (track, result) in results {
            match result {
                Ok((data, skipped)) => {
                    outcome.failures.extend(skipped);
                    outcome.tracks.insert(track, data);
                }
                Err(e) => {
                    warn!(%run_id, track = %track, error = %e, "Dropping track after failed fetch");
                    outcome
                        .failures
                        .push(FailedUnit::new(format!("track:{}", track), e));
                }
            }
        }

        info!(
            %run_id,
            network = %network.name,
            fetched = outcome.tracks.len(),
            failed = outcome.failures.len(),
            "Track fetch completed"
        );

        outcome
    }

    async fn fetch_track(&self, query: &TrackQuery) -> Result<(TrackData, Vec<FailedUnit>), QueryError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| QueryError::Unavailable("fetch limiter closed".to_string()))?;

        let timeout = self.config.query_timeout();
        let response = tokio::time::timeout(timeout, self.service.track_delegations(query))
            .await
            .map_err(|_| QueryError::Timeout(self.config.query_timeout_ms))??;

        let mut skipped = Vec::new();
        let mut delegations = Vec::with_capacity(response.delegations.len());
        for (index, raw) in response.delegations.iter().enumerate() {
            match DelegationRecord::try_from(raw) {
                Ok(record) => delegations.push(record),
                Err(e) => {
                    warn!(track = %query.track, index, error = %e, "Skipping malformed delegation");
                    skipped.push(FailedUnit::new(
                        format!("track:{}:delegation:{}", query.track, index),
                        e,
                    ));
                }
            }
        }

        Ok((
            TrackData {
                delegations,
                active_proposals_count: response.active_proposals_count,
            },
            skipped,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MockChainData;
    use votepower_core::{RawDelegation, TrackInfo};

    fn network() -> NetworkConfig {
        NetworkConfig::new("polkadot").with_tracks([
            TrackInfo::new(0, "root"),
            TrackInfo::new(1, "whitelisted_caller").fellowship(),
            TrackInfo::new(2, "wish_for_change"),
            TrackInfo::new(11, "treasurer"),
        ])
    }

    fn fast_config() -> FetchConfig {
        FetchConfig {
            query_timeout_ms: 50,
            max_concurrent: 4,
        }
    }

    #[tokio::test]
    async fn test_fellowship_tracks_skipped() {
        let mock = Arc::new(MockChainData::new());
        let fetcher = TrackFetcher::new(mock.clone());

        let outcome = fetcher.fetch(&[Address::from("A")], &network(), None).await;

        assert_eq!(outcome.tracks.len(), 3);
        assert!(!outcome.tracks.contains_key(&TrackId(1)));
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_track_filter() {
        let mock = Arc::new(MockChainData::new());
        let fetcher = TrackFetcher::new(mock.clone());

        let outcome = fetcher
            .fetch(&[Address::from("A")], &network(), Some(TrackId(11)))
            .await;

        assert_eq!(outcome.tracks.keys().copied().collect::<Vec<_>>(), vec![TrackId(11)]);
        assert_eq!(mock.queried_tracks().await, vec![TrackId(11)]);
    }

    #[tokio::test]
    async fn test_failure_isolated_to_track() {
        let mock = Arc::new(
            MockChainData::new()
                .with_track(0, vec![RawDelegation::new("A", "B", "10", Some(1))], 1)
                .with_failure(2, "indexer down")
                .with_hang(11),
        );
        let fetcher = TrackFetcher::with_config(mock, fast_config());

        let outcome = fetcher.fetch(&[Address::from("A")], &network(), None).await;

        assert_eq!(outcome.tracks.len(), 1);
        assert_eq!(outcome.tracks[&TrackId(0)].delegations.len(), 1);
        assert_eq!(outcome.tracks[&TrackId(0)].active_proposals_count, 1);

        let mut failed: Vec<_> = outcome.failures.iter().map(|f| f.unit.as_str()).collect();
        failed.sort();
        assert_eq!(failed, vec!["track:11", "track:2"]);
    }

    #[tokio::test]
    async fn test_malformed_record_dropped() {
        let mock = Arc::new(MockChainData::new().with_track(
            0,
            vec![
                RawDelegation::new("A", "B", "10", None),
                RawDelegation::new("C", "A", "ten", None),
            ],
            0,
        ));
        let fetcher = TrackFetcher::new(mock);

        let outcome = fetcher
            .fetch(&[Address::from("A")], &network(), Some(TrackId(0)))
            .await;

        assert_eq!(outcome.tracks[&TrackId(0)].delegations.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].unit, "track:0:delegation:1");
    }

    #[tokio::test]
    async fn test_empty_addresses_issue_no_queries() {
        let mock = Arc::new(MockChainData::new());
        let fetcher = TrackFetcher::new(mock.clone());

        let outcome = fetcher.fetch(&[], &network(), None).await;

        assert!(outcome.tracks.is_empty());
        assert_eq!(mock.call_count(), 0);
    }
}
