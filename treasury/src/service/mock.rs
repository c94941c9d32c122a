//! Mock balance-history service for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use super::traits::*;

/// Mock service for testing.
///
/// Answers by window start date; unscripted windows return no activity.
/// Can be told to fail or never answer on the n-th call (1-based).
pub struct MockBalanceHistory {
    id: String,
    windows: HashMap<String, Option<Vec<RawHistoryItem>>>,
    fail_on_call: Option<u32>,
    hang_on_call: Option<u32>,
    call_count: AtomicU32,
}

impl MockBalanceHistory {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            windows: HashMap::new(),
            fail_on_call: None,
            hang_on_call: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Answer the window starting on `start` (`YYYY-MM-DD`) with these readings.
    pub fn with_window(mut self, start: impl Into<String>, items: Vec<RawHistoryItem>) -> Self {
        self.windows.insert(start.into(), Some(items));
        self
    }

    /// Fail the n-th request.
    pub fn failing_on_call(mut self, call: u32) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// Never answer the n-th request.
    pub fn hanging_on_call(mut self, call: u32) -> Self {
        self.hang_on_call = Some(call);
        self
    }

    /// Get the number of requests received.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BalanceHistoryService for MockBalanceHistory {
    fn id(&self) -> &str {
        &self.id
    }

    async fn balance_history(
        &self,
        request: &BalanceHistoryRequest,
    ) -> Result<Option<Vec<RawHistoryItem>>, HistoryError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(HistoryError::RequestFailed(format!("scripted failure on call {}", call)));
        }
        if self.hang_on_call == Some(call) {
            futures::future::pending::<()>().await;
        }

        let key = request.start.format("%Y-%m-%d").to_string();
        Ok(self.windows.get(&key).cloned().flatten())
    }
}
