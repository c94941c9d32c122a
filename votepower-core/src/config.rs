//! Configuration for the delegation and treasury engines.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Per-track delegation fetch settings
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Monthly treasury tally settings
    #[serde(default)]
    pub treasury: TreasuryScheduleConfig,
}

impl EngineConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Delegation fetch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Timeout for one indexer query (ms)
    #[serde(default = "default_query_timeout_ms")]
    pub query_timeout_ms: u64,
    /// Maximum track queries in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl FetchConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: default_query_timeout_ms(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Treasury tally configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreasuryScheduleConfig {
    /// Day of month on which the tally runs
    #[serde(default = "default_run_day")]
    pub run_day: u32,
    /// Day of month each history window is anchored on
    #[serde(default = "default_anchor_day")]
    pub anchor_day: u32,
    /// Number of trailing monthly windows, current month included
    #[serde(default = "default_window_count")]
    pub window_count: u32,
    /// Timeout for one balance-history request (ms)
    #[serde(default = "default_query_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl TreasuryScheduleConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for TreasuryScheduleConfig {
    fn default() -> Self {
        Self {
            run_day: default_run_day(),
            anchor_day: default_anchor_day(),
            window_count: default_window_count(),
            request_timeout_ms: default_query_timeout_ms(),
        }
    }
}

fn default_query_timeout_ms() -> u64 { 30_000 }
fn default_max_concurrent() -> usize { 16 }
fn default_run_day() -> u32 { 2 }
fn default_anchor_day() -> u32 { 3 }
fn default_window_count() -> u32 { 7 }
