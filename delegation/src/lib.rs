//! Delegation - per-track delegation state and voting-power analytics
//!
//! Provides the delegation half of the governance analytics engine:
//! - Trait-based indexer access (Subsquid GraphQL, mock)
//! - Concurrent per-track fetch with per-track failure isolation
//! - Status classification per track for a set of addresses
//! - Conviction-weighted delegator / delegatee aggregation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          DelegationDashboard            │
//! └────────────────┬────────────────────────┘
//!                  │
//!      ┌───────────┴───────────┐
//!      ▼                       ▼
//! ┌─────────────┐       ┌──────────────────┐
//! │ TrackFetcher│       │ DelegateAggregator│
//! │ (fan-out)   │       │ (track analytics) │
//! └──────┬──────┘       └──────────────────┘
//!        ▼
//! ┌──────────────────────┐
//! │ DelegationClassifier │
//! └──────────────────────┘
//! ```

pub mod aggregator;
pub mod classifier;
pub mod dashboard;
pub mod fetcher;
pub mod service;

// Re-export main types for convenience
pub use aggregator::{DelegateAggregator, DelegationAnalytics};
pub use classifier::DelegationClassifier;
pub use dashboard::{DashboardResult, DelegationDashboard};
pub use fetcher::{FetchOutcome, TrackData, TrackFetcher};
pub use service::{ChainDataService, MockChainData, QueryError, SubsquidClient, TrackQuery};
