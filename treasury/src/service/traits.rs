//! Core trait for balance-history services.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Error types for balance-history requests.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// Request failed or the service reported a non-success status
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

/// Balance history of one account over a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceHistoryRequest {
    pub address: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One reading as returned by the service, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHistoryItem {
    pub date: String,
    pub balance: String,
}

impl RawHistoryItem {
    pub fn new(date: impl Into<String>, balance: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            balance: balance.into(),
        }
    }
}

/// Balance-history service for one chain.
#[async_trait]
pub trait BalanceHistoryService: Send + Sync {
    /// Service identifier for logs.
    fn id(&self) -> &str;

    /// Readings for the range. `None` means the account had no activity.
    async fn balance_history(
        &self,
        request: &BalanceHistoryRequest,
    ) -> Result<Option<Vec<RawHistoryItem>>, HistoryError>;
}
