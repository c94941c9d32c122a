//! Mock chain-data service for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;

use votepower_core::{RawDelegation, TrackId};

use super::traits::*;

/// Scripted behavior for one track.
#[derive(Debug, Clone)]
pub enum MockTrack {
    /// Answer with this response
    Respond(TrackQueryResponse),
    /// Fail with a request error
    Fail(String),
    /// Never answer
    Hang,
}

/// Mock service for testing.
///
/// Tracks without a script answer with no delegations.
pub struct MockChainData {
    tracks: HashMap<TrackId, MockTrack>,
    analytics: HashMap<TrackId, Vec<RawDelegation>>,
    call_count: AtomicU32,
    queried: Mutex<Vec<TrackId>>,
}

impl MockChainData {
    pub fn new() -> Self {
        Self {
            tracks: HashMap::new(),
            analytics: HashMap::new(),
            call_count: AtomicU32::new(0),
            queried: Mutex::new(Vec::new()),
        }
    }

    /// Answer a track with these edges.
    pub fn with_track(
        mut self,
        track: u16,
        delegations: Vec<RawDelegation>,
        active_proposals_count: u32,
    ) -> Self {
        self.tracks.insert(
            TrackId(track),
            MockTrack::Respond(TrackQueryResponse {
                delegations,
                active_proposals_count,
            }),
        );
        self
    }

    /// Fail every query for a track.
    pub fn with_failure(mut self, track: u16, reason: impl Into<String>) -> Self {
        self.tracks.insert(TrackId(track), MockTrack::Fail(reason.into()));
        self
    }

    /// Never answer queries for a track.
    pub fn with_hang(mut self, track: u16) -> Self {
        self.tracks.insert(TrackId(track), MockTrack::Hang);
        self
    }

    /// Edges returned by `all_track_delegations`.
    pub fn with_analytics(mut self, track: u16, delegations: Vec<RawDelegation>) -> Self {
        self.analytics.insert(TrackId(track), delegations);
        self
    }

    /// Number of queries received.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Tracks queried so far, in arrival order.
    pub async fn queried_tracks(&self) -> Vec<TrackId> {
        self.queried.lock().await.clone()
    }

    async fn script(&self, track: TrackId) -> Result<TrackQueryResponse, QueryError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.queried.lock().await.push(track);

        match self.tracks.get(&track) {
            Some(MockTrack::Respond(response)) => Ok(response.clone()),
            Some(MockTrack::Fail(reason)) => Err(QueryError::RequestFailed(reason.clone())),
            Some(MockTrack::Hang) => futures::future::pending().await,
            None => Ok(TrackQueryResponse::default()),
        }
    }
}

impl Default for MockChainData {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainDataService for MockChainData {
    fn id(&self) -> &str {
        "mock-indexer"
    }

    async fn track_delegations(&self, query: &TrackQuery) -> Result<TrackQueryResponse, QueryError> {
        self.script(query.track).await
    }

    async fn all_track_delegations(
        &self,
        _network: &str,
        track: TrackId,
    ) -> Result<Vec<RawDelegation>, QueryError> {
        if let Some(delegations) = self.analytics.get(&track) {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            return Ok(delegations.clone());
        }
        self.script(track).await.map(|r| r.delegations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use votepower_core::Address;

    fn query(track: u16) -> TrackQuery {
        TrackQuery {
            network: "polkadot".to_string(),
            addresses: vec![Address::from("A")],
            track: TrackId(track),
        }
    }

    #[tokio::test]
    async fn test_mock_scripts() {
        let mock = MockChainData::new()
            .with_track(0, vec![RawDelegation::new("A", "B", "1", None)], 2)
            .with_failure(1, "boom");

        let ok = mock.track_delegations(&query(0)).await.unwrap();
        assert_eq!(ok.active_proposals_count, 2);

        assert!(mock.track_delegations(&query(1)).await.is_err());

        let empty = mock.track_delegations(&query(9)).await.unwrap();
        assert!(empty.delegations.is_empty());

        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.queried_tracks().await, vec![TrackId(0), TrackId(1), TrackId(9)]);
    }
}
