//! Indexed chain-data service abstraction.
//!
//! - Subsquid GraphQL indexers
//! - Mock service for testing

pub mod mock;
pub mod subsquid;
pub mod traits;

pub use mock::{MockChainData, MockTrack};
pub use subsquid::SubsquidClient;
pub use traits::{ChainDataService, QueryError, TrackQuery, TrackQueryResponse};
