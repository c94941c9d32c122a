//! Core trait for indexed chain-data services.
//!
//! This module defines the `ChainDataService` trait - the seam between the
//! delegation engine and whatever indexer serves delegation edges.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use votepower_core::{Address, RawDelegation, TrackId};

/// Error types for indexer queries.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Service is not available for this network
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Request failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Rate limited by the service
    #[error("Rate limited, retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response did not match the expected shape
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No answer within the configured bound
    #[error("Timed out after {0}ms")]
    Timeout(u64),
}

/// Delegations touching a set of addresses on one track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackQuery {
    /// Network the track belongs to
    pub network: String,
    /// Normalized addresses; an edge matches if either end is listed
    pub addresses: Vec<Address>,
    /// Track to query
    pub track: TrackId,
}

/// Indexer answer for a [`TrackQuery`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackQueryResponse {
    /// Active delegation edges, unvalidated
    pub delegations: Vec<RawDelegation>,
    /// Proposals currently active on the track
    pub active_proposals_count: u32,
}

/// Indexed chain-data service.
///
/// Every call may fail independently; callers isolate failures per track.
#[async_trait]
pub trait ChainDataService: Send + Sync {
    /// Service identifier for logs.
    fn id(&self) -> &str;

    /// Active delegations to or from the queried addresses on one track,
    /// plus the track's active proposal count.
    async fn track_delegations(&self, query: &TrackQuery) -> Result<TrackQueryResponse, QueryError>;

    /// Every active delegation on one track.
    async fn all_track_delegations(
        &self,
        network: &str,
        track: TrackId,
    ) -> Result<Vec<RawDelegation>, QueryError>;
}
