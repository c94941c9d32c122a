//! TreasuryHistoryAggregator - merges per-chain balance histories into a
//! month-keyed treasury tally.
//!
//! Runs once per invocation and does work only on the configured run day.
//! The two source chains are fetched concurrently; windows within a chain
//! are fetched in order and the first failure drops the whole chain.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

use votepower_core::{
    BalanceEntry, BigAmount, DocumentStore, Error, FailedUnit, MonthlyBalanceSeries,
    MonthlyTreasuryTally, NetworkRegistry, Result, SetOptions, TreasuryScheduleConfig,
};

use crate::schedule::{is_due, month_name, month_windows, MonthWindow};
use crate::service::{BalanceHistoryRequest, BalanceHistoryService, HistoryError, RawHistoryItem};

/// Store field the tally is merged into.
pub const TALLY_FIELD: &str = "monthly_treasury_tally";

/// Store field holding the long-term history read back for consumers.
pub const HISTORY_FIELD: &str = "treasury_amount_history";

const RELAY_CHAIN: &str = "relay_chain";
const ASSET_HUB: &str = "asset_hub";

/// Result of one tally invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TallyOutcome {
    /// Invoked on a day other than the run day; nothing was requested
    NotDue { today: NaiveDate },
    /// Tally computed and persisted
    Completed(TallyReport),
}

/// A persisted tally plus the chains that were left out of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyReport {
    pub tally: MonthlyTreasuryTally,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedUnit>,
}

/// One month of the stored long-term treasury history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountPerMonth {
    pub month: String,
    pub amount: String,
}

/// Long-term treasury history document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryAmountHistory {
    pub data: Vec<AmountPerMonth>,
}

/// Monthly treasury tally over a relay chain and its asset hub.
pub struct TreasuryHistoryAggregator {
    store: Arc<dyn DocumentStore>,
    registry: NetworkRegistry,
    relay_chain: Arc<dyn BalanceHistoryService>,
    asset_hub: Arc<dyn BalanceHistoryService>,
    config: TreasuryScheduleConfig,
}

impl TreasuryHistoryAggregator {
    /// Create an aggregator with default scheduling.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        relay_chain: Arc<dyn BalanceHistoryService>,
        asset_hub: Arc<dyn BalanceHistoryService>,
    ) -> Self {
        Self {
            registry: NetworkRegistry::new(Arc::clone(&store)),
            store,
            relay_chain,
            asset_hub,
            config: TreasuryScheduleConfig::default(),
        }
    }

    /// Create with configuration.
    pub fn with_config(mut self, config: TreasuryScheduleConfig) -> Self {
        self.config = config;
        self
    }

    /// Compute and persist the tally for `network` if `today` is the run day.
    pub async fn run(&self, network: &str, today: NaiveDate) -> Result<TallyOutcome> {
        if !is_due(today, &self.config) {
            debug!(network, %today, run_day = self.config.run_day, "Treasury tally not due");
            return Ok(TallyOutcome::NotDue { today });
        }

        let windows = month_windows(today, &self.config)?;
        let sources = self
            .registry
            .load(network)
            .await?
            .treasury
            .ok_or_else(|| Error::Config(format!("network {} has no treasury sources", network)))?;

        let (relay, asset_hub) = tokio::join!(
            self.chain_series(RELAY_CHAIN, self.relay_chain.as_ref(), &sources.relay_chain, &windows),
            self.chain_series(ASSET_HUB, self.asset_hub.as_ref(), &sources.asset_hub, &windows),
        );

        let mut failures = Vec::new();
        let mut series = Vec::new();
        for (chain, result) in [(RELAY_CHAIN, relay), (ASSET_HUB, asset_hub)] {
            match result {
                Ok(chain_series) => series.extend(chain_series),
                Err(e) => {
                    warn!(network, chain, error = %e, "Dropping chain from treasury tally");
                    failures.push(FailedUnit::new(format!("chain:{}", chain), e));
                }
            }
        }

        let tally = merge_series(&series);

        self.store
            .set(
                network,
                json!({ TALLY_FIELD: serde_json::to_value(&tally)? }),
                SetOptions::merge(),
            )
            .await?;

        info!(
            network,
            months = tally.len(),
            failures = failures.len(),
            "Treasury tally persisted"
        );

        Ok(TallyOutcome::Completed(TallyReport { tally, failures }))
    }

    /// The stored long-term treasury history of `network`.
    pub async fn read_history(&self, network: &str) -> Result<TreasuryAmountHistory> {
        read_history(self.store.as_ref(), network).await
    }

    /// Every window for one chain, oldest first. The first failed request
    /// abandons the rest.
    async fn chain_series(
        &self,
        chain: &str,
        service: &dyn BalanceHistoryService,
        address: &str,
        windows: &[MonthWindow],
    ) -> std::result::Result<Vec<MonthlyBalanceSeries>, HistoryError> {
        let mut series = Vec::with_capacity(windows.len());

        for window in windows {
            let request = BalanceHistoryRequest {
                address: address.to_string(),
                start: window.start,
                end: window.end,
            };

            let history = tokio::time::timeout(
                self.config.request_timeout(),
                service.balance_history(&request),
            )
            .await
            .map_err(|_| HistoryError::Timeout(self.config.request_timeout_ms))??;

            let window_series = match history {
                Some(items) => parse_series(chain, &items),
                None => MonthlyBalanceSeries::placeholder(window.start),
            };
            debug!(
                chain,
                service = service.id(),
                start = %window.start,
                entries = window_series.entries().len(),
                "Fetched balance window"
            );
            series.push(window_series);
        }

        Ok(series)
    }
}

/// Read the long-term treasury history document of `network`.
pub async fn read_history(store: &dyn DocumentStore, network: &str) -> Result<TreasuryAmountHistory> {
    let document = store
        .get(network)
        .await?
        .ok_or_else(|| Error::UnknownNetwork(network.to_string()))?;

    match document.get(HISTORY_FIELD) {
        None | Some(Value::Null) => Err(Error::Store("no treasury history".to_string())),
        Some(history) => Ok(serde_json::from_value(history.clone())?),
    }
}

/// Validate raw readings, dropping the ones that do not parse.
fn parse_series(chain: &str, items: &[RawHistoryItem]) -> MonthlyBalanceSeries {
    let entries = items
        .iter()
        .filter_map(|item| {
            let date = match NaiveDate::parse_from_str(&item.date, "%Y-%m-%d") {
                Ok(date) => date,
                Err(e) => {
                    warn!(chain, date = %item.date, error = %e, "Skipping balance reading with bad date");
                    return None;
                }
            };
            match BigAmount::from_str(&item.balance) {
                Ok(balance) => Some(BalanceEntry { date, balance }),
                Err(e) => {
                    warn!(chain, %date, error = %e, "Skipping balance reading with bad amount");
                    None
                }
            }
        })
        .collect();
    MonthlyBalanceSeries(entries)
}

/// Sum series into a month-name keyed tally.
///
/// Series whose latest balance is zero are left out. For every entry of a
/// kept series, the series' latest balance is added under the month of that
/// entry's date.
pub fn merge_series<'a>(series: impl IntoIterator<Item = &'a MonthlyBalanceSeries>) -> MonthlyTreasuryTally {
    let mut tally = MonthlyTreasuryTally::new();

    for s in series {
        let latest = match s.latest() {
            Some(entry) if !entry.balance.is_zero() => &entry.balance,
            _ => continue,
        };
        for entry in s.entries() {
            tally.add(month_name(entry.date), latest);
        }
    }

    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MockBalanceHistory;
    use votepower_core::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(d: NaiveDate, balance: u64) -> BalanceEntry {
        BalanceEntry {
            date: d,
            balance: BigAmount::from(balance),
        }
    }

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new().with_document(
            "polkadot",
            json!({
                "open_gov": true,
                "treasury": {
                    "relay_chain": "13UVJyLnbVp9RBZYFwFGyDvVd1y27Tt8tkntv6Q7JVPhFsTB",
                    "asset_hub": "14xmwinmCEz6oRrFdczHKqHgWNMiCysE2KrA4jXXAAM1Eogk"
                },
                "monthly_treasury_tally": {"june": "7"},
                "treasury_amount_history": {
                    "data": [{"month": "january", "amount": "100"}]
                }
            }),
        ))
    }

    #[test]
    fn test_merge_broadcasts_latest_balance() {
        let series = MonthlyBalanceSeries(vec![entry(date(2024, 2, 3), 5), entry(date(2024, 3, 3), 9)]);
        let tally = merge_series([&series]);

        assert_eq!(tally.get("february"), Some(&BigAmount::from(9u64)));
        assert_eq!(tally.get("march"), Some(&BigAmount::from(9u64)));
    }

    #[test]
    fn test_merge_skips_zero_latest_and_sums_chains() {
        let placeholder = MonthlyBalanceSeries::placeholder(date(2024, 3, 3));
        let relay = MonthlyBalanceSeries(vec![entry(date(2024, 3, 3), 40)]);
        let asset_hub = MonthlyBalanceSeries(vec![entry(date(2024, 3, 3), 2)]);
        let zero_latest = MonthlyBalanceSeries(vec![entry(date(2024, 1, 3), 10), entry(date(2024, 4, 3), 0)]);

        let tally = merge_series([&placeholder, &relay, &asset_hub, &zero_latest]);

        assert_eq!(tally.len(), 1);
        assert_eq!(tally.get("march"), Some(&BigAmount::from(42u64)));
    }

    #[test]
    fn test_parse_series_drops_malformed_readings() {
        let items = vec![
            RawHistoryItem::new("2024-03-03", "12"),
            RawHistoryItem::new("yesterday", "5"),
            RawHistoryItem::new("2024-03-04", "1.5"),
        ];
        let series = parse_series(RELAY_CHAIN, &items);
        assert_eq!(series.entries(), &[entry(date(2024, 3, 3), 12)]);
    }

    #[tokio::test]
    async fn test_not_due_makes_no_requests() {
        let relay = Arc::new(MockBalanceHistory::new("relay"));
        let asset_hub = Arc::new(MockBalanceHistory::new("asset-hub"));
        let aggregator = TreasuryHistoryAggregator::new(store(), relay.clone(), asset_hub.clone());

        let outcome = aggregator.run("polkadot", date(2024, 3, 5)).await.unwrap();

        assert_eq!(outcome, TallyOutcome::NotDue { today: date(2024, 3, 5) });
        assert_eq!(relay.call_count(), 0);
        assert_eq!(asset_hub.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_chain_does_not_block_other() {
        let relay = Arc::new(
            MockBalanceHistory::new("relay")
                .with_window("2023-09-03", vec![RawHistoryItem::new("2023-09-03", "800")])
                .with_window("2024-01-03", vec![RawHistoryItem::new("2024-01-03", "1000")])
                .failing_on_call(3),
        );
        let asset_hub = Arc::new(
            MockBalanceHistory::new("asset-hub")
                .with_window("2024-02-03", vec![RawHistoryItem::new("2024-02-03", "250")])
                .with_window("2024-03-03", vec![RawHistoryItem::new("2024-03-03", "300")]),
        );
        let store = store();
        let aggregator = TreasuryHistoryAggregator::new(store.clone(), relay.clone(), asset_hub.clone());

        let outcome = aggregator.run("polkadot", date(2024, 3, 2)).await.unwrap();
        let TallyOutcome::Completed(report) = outcome else {
            panic!("expected a completed tally");
        };

        assert_eq!(relay.call_count(), 3);
        assert_eq!(asset_hub.call_count(), 7);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].unit, "chain:relay_chain");
        assert_eq!(report.tally.get("september"), None);
        assert_eq!(report.tally.get("january"), None);
        assert_eq!(report.tally.get("february"), Some(&BigAmount::from(250u64)));
        assert_eq!(report.tally.get("march"), Some(&BigAmount::from(300u64)));

        let persisted = store.get("polkadot").await.unwrap().unwrap();
        assert_eq!(persisted[TALLY_FIELD]["february"], json!("250"));
        assert_eq!(persisted[TALLY_FIELD]["june"], json!("7"));
        assert!(persisted.get("treasury").is_some());
    }

    #[tokio::test]
    async fn test_hung_window_drops_chain() {
        let relay = Arc::new(
            MockBalanceHistory::new("relay")
                .with_window("2023-09-03", vec![RawHistoryItem::new("2023-09-03", "800")])
                .hanging_on_call(2),
        );
        let asset_hub = Arc::new(
            MockBalanceHistory::new("asset-hub")
                .with_window("2024-03-03", vec![RawHistoryItem::new("2024-03-03", "300")]),
        );
        let config = TreasuryScheduleConfig {
            request_timeout_ms: 50,
            ..Default::default()
        };
        let aggregator = TreasuryHistoryAggregator::new(store(), relay.clone(), asset_hub.clone())
            .with_config(config);

        let outcome = aggregator.run("polkadot", date(2024, 3, 2)).await.unwrap();
        let TallyOutcome::Completed(report) = outcome else {
            panic!("expected a completed tally");
        };

        assert_eq!(relay.call_count(), 2);
        assert_eq!(asset_hub.call_count(), 7);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].unit, "chain:relay_chain");
        assert!(report.failures[0].reason.contains("50ms"));
        assert_eq!(report.tally.get("september"), None);
        assert_eq!(report.tally.get("march"), Some(&BigAmount::from(300u64)));
    }

    #[tokio::test]
    async fn test_missing_treasury_sources_is_config_error() {
        let store = Arc::new(
            MemoryStore::new()
                .with_document("kusama", json!({"open_gov": true}))
                .with_document("westend", json!({"open_gov": true, "treasury": {"relay_chain": "5Ec4A"}})),
        );
        let relay = Arc::new(MockBalanceHistory::new("relay"));
        let aggregator = TreasuryHistoryAggregator::new(store, relay.clone(), relay.clone());

        for network in ["kusama", "westend"] {
            let result = aggregator.run(network, date(2024, 3, 2)).await;
            assert!(matches!(result, Err(Error::Config(_))), "{network}");
        }
        assert_eq!(relay.call_count(), 0);
    }

    #[tokio::test]
    async fn test_read_history() {
        let relay = Arc::new(MockBalanceHistory::new("relay"));
        let store = store();
        let aggregator = TreasuryHistoryAggregator::new(store.clone(), relay.clone(), relay);

        let history = aggregator.read_history("polkadot").await.unwrap();
        assert_eq!(history.data[0].month, "january");
        assert_eq!(history.data[0].amount, "100");

        assert!(matches!(
            aggregator.read_history("westend").await,
            Err(Error::UnknownNetwork(_))
        ));

        store
            .set("polkadot", json!({ HISTORY_FIELD: null }), SetOptions::merge())
            .await
            .unwrap();
        assert!(matches!(aggregator.read_history("polkadot").await, Err(Error::Store(_))));
    }
}
