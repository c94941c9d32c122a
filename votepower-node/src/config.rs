//! Node configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use votepower_core::EngineConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub subsquid: SubsquidConfig,
    #[serde(default)]
    pub subscan: SubscanConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Read a TOML config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// JSON file holding one document per network
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsquidConfig {
    /// GraphQL endpoint; `{network}` is replaced with the network name
    #[serde(default = "default_subsquid_url")]
    pub url_template: String,

    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for SubsquidConfig {
    fn default() -> Self {
        Self {
            url_template: default_subsquid_url(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscanConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    /// Subscan hosts per network
    #[serde(default = "default_subscan_networks")]
    pub networks: BTreeMap<String, SubscanHosts>,
}

impl Default for SubscanConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            networks: default_subscan_networks(),
        }
    }
}

/// Subscan hosts for the two treasury source chains of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscanHosts {
    pub relay_chain: String,
    pub asset_hub: String,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("votepower-store.json")
}

fn default_subsquid_url() -> String {
    "https://squid.subsquid.io/{network}-polkassembly/graphql".to_string()
}

fn default_subscan_networks() -> BTreeMap<String, SubscanHosts> {
    ["polkadot", "kusama"]
        .into_iter()
        .map(|network| {
            (
                network.to_string(),
                SubscanHosts {
                    relay_chain: format!("https://{}.api.subscan.io", network),
                    asset_hub: format!("https://assethub-{}.api.subscan.io", network),
                },
            )
        })
        .collect()
}
