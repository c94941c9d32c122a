//! Subscan balance-history client.
//!
//! Posts `{address, start, end}` to `/api/scan/account/balance_history` on
//! the chain's Subscan host.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::traits::*;

const BALANCE_HISTORY_PATH: &str = "/api/scan/account/balance_history";
const SUCCESS_MESSAGE: &str = "Success";

/// Subscan client for one chain.
pub struct SubscanClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl SubscanClient {
    /// Create a client for a Subscan host, e.g. `https://polkadot.api.subscan.io`.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn history_url(&self) -> String {
        format!("{}{}", self.base_url, BALANCE_HISTORY_PATH)
    }
}

#[derive(Debug, Deserialize)]
struct SubscanResponse {
    #[serde(default)]
    message: String,
    data: Option<HistoryData>,
}

#[derive(Debug, Deserialize)]
struct HistoryData {
    history: Option<Vec<RawHistoryItem>>,
}

#[async_trait]
impl BalanceHistoryService for SubscanClient {
    fn id(&self) -> &str {
        &self.base_url
    }

    async fn balance_history(
        &self,
        request: &BalanceHistoryRequest,
    ) -> Result<Option<Vec<RawHistoryItem>>, HistoryError> {
        debug!(host = %self.base_url, address = %request.address, start = %request.start, "Requesting balance history");

        let mut http_request = self.client.post(self.history_url());
        if let Some(key) = &self.api_key {
            http_request = http_request.header("X-API-Key", key);
        }

        let response = http_request
            .json(request)
            .send()
            .await
            .map_err(|e| HistoryError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(HistoryError::RateLimited { retry_after_ms: None });
            }

            return Err(HistoryError::RequestFailed(format!("HTTP {}: {}", status, body)));
        }

        let parsed: SubscanResponse = response
            .json()
            .await
            .map_err(|e| HistoryError::ParseError(e.to_string()))?;

        if parsed.message != SUCCESS_MESSAGE {
            return Err(HistoryError::RequestFailed(format!(
                "service reported {:?}",
                parsed.message
            )));
        }

        Ok(parsed.data.and_then(|d| d.history))
    }
}
