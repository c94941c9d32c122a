//! Votepower Core - shared building blocks for governance analytics
//!
//! Everything the delegation and treasury engines share:
//!
//! - **Amounts**: exact arbitrary-precision [`BigAmount`] arithmetic
//! - **Conviction**: the voting-power rule for delegated balances
//! - **Data model**: delegation edges, track summaries, balance series
//! - **Seams**: [`DocumentStore`] persistence and [`AddressCodec`] normalization
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐      ┌──────────────┐
//! │  delegation  │      │   treasury   │
//! └──────┬───────┘      └──────┬───────┘
//!        └──────────┬──────────┘
//!                   ▼
//!  ┌─────────────────────────────────────┐
//!  │            votepower-core           │
//!  │  BigAmount · types · NetworkRegistry│
//!  │  DocumentStore · AddressCodec       │
//!  └─────────────────────────────────────┘
//! ```

pub mod address;
pub mod amount;
pub mod config;
pub mod conviction;
pub mod error;
pub mod network;
pub mod store;
pub mod types;

// Re-export main types
pub use address::{AddressCodec, TrimmingCodec};
pub use amount::BigAmount;
pub use config::{EngineConfig, FetchConfig, TreasuryScheduleConfig};
pub use conviction::{voting_power, LockedPeriod, NO_CONVICTION_DIVISOR};
pub use error::{Error, Result};
pub use network::{NetworkConfig, NetworkRegistry, TrackInfo, TreasurySources};
pub use store::{DocumentStore, FileStore, MemoryStore, SetOptions};
pub use types::*;
