//! Document store seam.
//!
//! The engines only need single-document reads and merge-capable upserts
//! keyed by network name. [`MemoryStore`] backs tests; [`FileStore`] keeps
//! documents in one JSON file for the command-line node.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::error::{Error, Result};

/// Options for [`DocumentStore::set`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Deep-merge into the existing document instead of replacing it
    pub merge: bool,
}

impl SetOptions {
    pub fn merge() -> Self {
        Self { merge: true }
    }

    pub fn replace() -> Self {
        Self { merge: false }
    }
}

/// Key-value document persistence.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write a document, optionally merging into what is stored.
    async fn set(&self, key: &str, value: Value, options: SetOptions) -> Result<()>;
}

/// Merge `patch` into `target`.
///
/// Objects merge field by field, recursively. Any other value replaces
/// what was there.
pub fn merge_json(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn apply(documents: &mut Map<String, Value>, key: &str, value: Value, options: SetOptions) {
    match documents.get_mut(key) {
        Some(existing) if options.merge => merge_json(existing, value),
        _ => {
            documents.insert(key.to_string(), value);
        }
    }
}

/// In-memory document store.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document.
    pub fn with_document(self, key: impl Into<String>, value: Value) -> Self {
        let mut documents = self.documents.into_inner();
        documents.insert(key.into(), value);
        Self {
            documents: RwLock::new(documents),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value, options: SetOptions) -> Result<()> {
        let mut documents = self.documents.write().await;
        apply(&mut documents, key, value, options);
        Ok(())
    }
}

/// JSON-file document store.
///
/// The file holds one object whose top-level keys are document keys. Every
/// write rewrites the whole file into a sibling temp file and renames it over
/// the original, so readers see either the old or the new contents.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }

    async fn load(&self) -> Result<Map<String, Value>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Map::new()),
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes)? {
                Value::Object(map) => Ok(map),
                _ => Err(Error::Store(format!(
                    "{} does not contain a JSON object",
                    self.path.display()
                ))),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut documents = self.load().await?;
        Ok(documents.remove(key))
    }

    async fn set(&self, key: &str, value: Value, options: SetOptions) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut documents = self.load().await?;
        apply(&mut documents, key, value, options);

        let bytes = serde_json::to_vec_pretty(&Value::Object(documents))?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        debug!(path = %self.path.display(), key, "Document written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_json_is_deep() {
        let mut doc = json!({"name": "polkadot", "tally": {"march": "1", "april": "2"}});
        merge_json(&mut doc, json!({"tally": {"april": "5", "may": "3"}}));
        assert_eq!(
            doc,
            json!({"name": "polkadot", "tally": {"march": "1", "april": "5", "may": "3"}})
        );
    }

    #[tokio::test]
    async fn test_memory_store_merge_and_replace() {
        let store = MemoryStore::new().with_document("kusama", json!({"a": 1, "b": {"c": 2}}));

        store
            .set("kusama", json!({"b": {"d": 3}}), SetOptions::merge())
            .await
            .unwrap();
        assert_eq!(
            store.get("kusama").await.unwrap().unwrap(),
            json!({"a": 1, "b": {"c": 2, "d": 3}})
        );

        store
            .set("kusama", json!({"z": 0}), SetOptions::replace())
            .await
            .unwrap();
        assert_eq!(store.get("kusama").await.unwrap().unwrap(), json!({"z": 0}));
        assert!(store.get("westend").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::new(&path);
        assert!(store.get("polkadot").await.unwrap().is_none());

        store
            .set("polkadot", json!({"open_gov": true}), SetOptions::merge())
            .await
            .unwrap();
        store
            .set("polkadot", json!({"tally": {"june": "4"}}), SetOptions::merge())
            .await
            .unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(
            reopened.get("polkadot").await.unwrap().unwrap(),
            json!({"open_gov": true, "tally": {"june": "4"}})
        );
        assert!(!store.staging_path().exists());
    }

    #[tokio::test]
    async fn test_file_store_reads_during_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("store.json"));
        store
            .set("kusama", json!({"open_gov": true}), SetOptions::merge())
            .await
            .unwrap();

        let writes = async {
            for i in 0..25 {
                store
                    .set("kusama", json!({"tally": {"june": i.to_string()}}), SetOptions::merge())
                    .await
                    .unwrap();
            }
        };
        let reads = async {
            for _ in 0..25 {
                let document = store.get("kusama").await.unwrap();
                assert_eq!(document.unwrap()["open_gov"], json!(true));
            }
        };
        tokio::join!(writes, reads);

        assert_eq!(
            store.get("kusama").await.unwrap().unwrap()["tally"]["june"],
            json!("24")
        );
    }
}
