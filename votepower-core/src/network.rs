//! Network and track registry, read from the document store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::store::DocumentStore;
use crate::types::TrackId;

/// A governance track as configured for a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub track_id: TrackId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub group: String,
    /// Fellowship-origin tracks never take part in delegation queries
    #[serde(default)]
    pub fellowship_origin: bool,
}

impl TrackInfo {
    pub fn new(track_id: u16, name: impl Into<String>) -> Self {
        Self {
            track_id: TrackId(track_id),
            name: name.into(),
            group: String::new(),
            fellowship_origin: false,
        }
    }

    pub fn fellowship(mut self) -> Self {
        self.fellowship_origin = true;
        self
    }
}

/// Source-chain treasury accounts whose balances make up the tally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasurySources {
    /// Treasury account on the relay chain
    pub relay_chain: String,
    /// Treasury account on asset hub
    pub asset_hub: String,
}

/// Everything the engines need to know about one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    /// Whether the network runs track-based (OpenGov) governance
    #[serde(default)]
    pub open_gov: bool,
    #[serde(default)]
    pub tracks: Vec<TrackInfo>,
    #[serde(default)]
    pub treasury: Option<TreasurySources>,
}

impl NetworkConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            open_gov: true,
            tracks: Vec::new(),
            treasury: None,
        }
    }

    pub fn with_tracks(mut self, tracks: impl IntoIterator<Item = TrackInfo>) -> Self {
        self.tracks = tracks.into_iter().collect();
        self
    }

    pub fn with_treasury(mut self, sources: TreasurySources) -> Self {
        self.treasury = Some(sources);
        self
    }

    /// Tracks eligible for delegation queries, optionally narrowed to one.
    pub fn delegation_tracks(&self, filter: Option<TrackId>) -> Vec<TrackId> {
        self.tracks
            .iter()
            .filter(|t| !t.fellowship_origin)
            .filter(|t| filter.map_or(true, |wanted| t.track_id == wanted))
            .map(|t| t.track_id)
            .collect()
    }
}

/// Reads [`NetworkConfig`] documents from a [`DocumentStore`].
pub struct NetworkRegistry {
    store: Arc<dyn DocumentStore>,
}

impl NetworkRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Load a network document.
    ///
    /// `tracks` may be a list or an object keyed by track name. Entries that
    /// do not carry a valid track id are skipped. A malformed `treasury`
    /// entry loads as `None`.
    pub async fn load(&self, network: &str) -> Result<NetworkConfig> {
        let document = self
            .store
            .get(network)
            .await?
            .ok_or_else(|| Error::UnknownNetwork(network.to_string()))?;

        let open_gov = document
            .get("open_gov")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let treasury = parse_treasury(network, document.get("treasury"));

        let tracks = parse_tracks(network, document.get("tracks"));
        debug!(network, tracks = tracks.len(), open_gov, "Loaded network config");

        Ok(NetworkConfig {
            name: network.to_string(),
            open_gov,
            tracks,
            treasury,
        })
    }
}

fn parse_treasury(network: &str, treasury: Option<&Value>) -> Option<TreasurySources> {
    match treasury {
        None | Some(Value::Null) => None,
        Some(value) => match serde_json::from_value(value.clone()) {
            Ok(sources) => Some(sources),
            Err(e) => {
                warn!(network, error = %e, "Ignoring malformed treasury sources");
                None
            }
        },
    }
}

fn parse_tracks(network: &str, tracks: Option<&Value>) -> Vec<TrackInfo> {
    let entries: Vec<(Option<&str>, &Value)> = match tracks {
        Some(Value::Array(items)) => items.iter().map(|v| (None, v)).collect(),
        Some(Value::Object(items)) => items.iter().map(|(k, v)| (Some(k.as_str()), v)).collect(),
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<TrackInfo>(value.clone()) {
            Ok(mut track) => {
                if track.name.is_empty() {
                    track.name = key.unwrap_or_default().to_string();
                }
                Some(track)
            }
            Err(e) => {
                warn!(network, entry = ?key, error = %e, "Skipping malformed track entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn registry(document: Value) -> NetworkRegistry {
        NetworkRegistry::new(Arc::new(MemoryStore::new().with_document("polkadot", document)))
    }

    #[tokio::test]
    async fn test_load_track_list() {
        let registry = registry(json!({
            "open_gov": true,
            "tracks": [
                {"track_id": 0, "name": "root"},
                {"track_id": 1, "name": "whitelisted_caller", "fellowship_origin": true},
                {"track_id": "eleven", "name": "broken"},
                {"track_id": 34, "name": "big_spender", "group": "Treasury"}
            ],
            "treasury": {"relay_chain": "13UVJ", "asset_hub": "14xmw"}
        }));

        let config = registry.load("polkadot").await.unwrap();
        assert!(config.open_gov);
        assert_eq!(config.tracks.len(), 3);
        assert_eq!(config.delegation_tracks(None), vec![TrackId(0), TrackId(34)]);
        assert_eq!(config.delegation_tracks(Some(TrackId(34))), vec![TrackId(34)]);
        assert_eq!(config.delegation_tracks(Some(TrackId(1))), Vec::<TrackId>::new());
        assert_eq!(config.treasury.unwrap().asset_hub, "14xmw");
    }

    #[tokio::test]
    async fn test_load_track_object_uses_keys_as_names() {
        let registry = registry(json!({
            "open_gov": true,
            "tracks": {
                "root": {"track_id": 0},
                "negative": {"track_id": -4}
            }
        }));

        let config = registry.load("polkadot").await.unwrap();
        assert_eq!(config.tracks, vec![TrackInfo::new(0, "root")]);
        assert!(config.treasury.is_none());
    }

    #[tokio::test]
    async fn test_malformed_treasury_keeps_tracks() {
        let registry = registry(json!({
            "open_gov": true,
            "tracks": [{"track_id": 0, "name": "root"}, {"track_id": 2, "name": "wish_for_change"}],
            "treasury": {"relay_chain": "13UVJ"}
        }));

        let config = registry.load("polkadot").await.unwrap();
        assert!(config.treasury.is_none());
        assert_eq!(config.delegation_tracks(None), vec![TrackId(0), TrackId(2)]);
    }

    #[tokio::test]
    async fn test_unknown_network() {
        let registry = registry(json!({}));
        let result = registry.load("rococo").await;
        assert!(matches!(result, Err(Error::UnknownNetwork(name)) if name == "rococo"));
    }
}
