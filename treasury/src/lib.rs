//! Treasury - monthly treasury balance tally
//!
//! Once a month, pulls trailing balance-history windows for the treasury
//! accounts on a relay chain and its asset hub, and merges them into a
//! month-name keyed tally that is upserted into the network document.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  TreasuryHistoryAggregator   │──── is_due / month_windows
//! └──────┬────────────────┬──────┘
//!        │ (concurrent)   │
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │ relay chain │  │  asset hub  │   windows in order,
//! │  history    │  │  history    │   first failure drops the chain
//! └──────┬──────┘  └──────┬──────┘
//!        └───────┬────────┘
//!                ▼
//!         merge_series ──► DocumentStore (merge)
//! ```

pub mod aggregator;
pub mod schedule;
pub mod service;

pub use aggregator::{
    merge_series, read_history, AmountPerMonth, TallyOutcome, TallyReport, TreasuryAmountHistory,
    TreasuryHistoryAggregator,
};
pub use schedule::{is_due, month_name, month_windows, MonthWindow};
pub use service::{
    BalanceHistoryRequest, BalanceHistoryService, HistoryError, MockBalanceHistory, RawHistoryItem,
    SubscanClient,
};
