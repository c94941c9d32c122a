//! DelegationDashboard - entry point for per-address and per-track queries.
//!
//! Wires the network registry, the fetcher, the classifier and the
//! aggregator together behind two calls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

use votepower_core::{
    Address, AddressCodec, DocumentStore, Error, FailedUnit, FetchConfig, NetworkRegistry, Result,
    TrackDelegationSummary, TrackId,
};

use crate::aggregator::{DelegateAggregator, DelegationAnalytics};
use crate::classifier::DelegationClassifier;
use crate::fetcher::TrackFetcher;
use crate::service::{ChainDataService, QueryError};

/// Summaries for the tracks that could be fetched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardResult {
    /// One summary per successfully fetched track, sorted by track id
    pub summaries: Vec<TrackDelegationSummary>,
    /// Tracks and records that were left out
    pub failures: Vec<FailedUnit>,
}

/// Delegation queries for a governance dashboard.
pub struct DelegationDashboard {
    registry: NetworkRegistry,
    service: Arc<dyn ChainDataService>,
    codec: Arc<dyn AddressCodec>,
    fetcher: TrackFetcher,
    config: FetchConfig,
}

impl DelegationDashboard {
    /// Create a dashboard over the given collaborators.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        service: Arc<dyn ChainDataService>,
        codec: Arc<dyn AddressCodec>,
    ) -> Self {
        Self {
            registry: NetworkRegistry::new(store),
            fetcher: TrackFetcher::new(Arc::clone(&service)),
            service,
            codec,
            config: FetchConfig::default(),
        }
    }

    /// Create with configuration.
    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.fetcher = TrackFetcher::with_config(Arc::clone(&self.service), config.clone());
        self.config = config;
        self
    }

    /// Per-track delegation state of `addresses` on `network`.
    ///
    /// Empty when no addresses are given or the network has no track-based
    /// governance.
    pub async fn summaries(
        &self,
        addresses: &[String],
        network: &str,
        track: Option<TrackId>,
    ) -> Result<DashboardResult> {
        if addresses.is_empty() {
            return Ok(DashboardResult::default());
        }

        let config = self.registry.load(network).await?;
        if !config.open_gov {
            debug!(network, "Network has no track governance");
            return Ok(DashboardResult::default());
        }

        let normalized: Vec<Address> = addresses
            .iter()
            .map(|a| self.codec.normalize(a, network))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let outcome = self.fetcher.fetch(&normalized, &config, track).await;

        let classifier = DelegationClassifier::new(normalized);
        let mut summaries: Vec<TrackDelegationSummary> = outcome
            .tracks
            .into_iter()
            .map(|(track, data)| classifier.classify(track, data))
            .collect();
        summaries.sort_by_key(|s| s.track);

        info!(
            network,
            tracks = summaries.len(),
            failures = outcome.failures.len(),
            "Delegation dashboard assembled"
        );

        Ok(DashboardResult {
            summaries,
            failures: outcome.failures,
        })
    }

    /// Delegator and delegatee analytics over every active delegation on a track.
    pub async fn track_analytics(&self, network: &str, track: TrackId) -> Result<DelegationAnalytics> {
        let unit = format!("track:{}", track);

        let delegations = tokio::time::timeout(
            self.config.query_timeout(),
            self.service.all_track_delegations(network, track),
        )
        .await
        .map_err(|_| Error::fetch(&unit, QueryError::Timeout(self.config.query_timeout_ms)))?
        .map_err(|e| Error::fetch(&unit, e))?;

        debug!(network, track = %track, edges = delegations.len(), "Aggregating track delegations");
        Ok(DelegateAggregator::aggregate_raw(&delegations))
    }
}
