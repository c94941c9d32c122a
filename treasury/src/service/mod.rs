//! Balance-history service abstraction.
//!
//! - Subscan HTTP API
//! - Mock service for testing

pub mod mock;
pub mod subscan;
pub mod traits;

pub use mock::MockBalanceHistory;
pub use subscan::SubscanClient;
pub use traits::{BalanceHistoryRequest, BalanceHistoryService, HistoryError, RawHistoryItem};
