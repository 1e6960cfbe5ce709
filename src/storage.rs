//! Key-value persistence port
//!
//! The engine persists two JSON blobs (stats and learning journal) under
//! fixed keys. Hosts plug in whatever store they have by implementing
//! [`KeyValueStore`]; an in-memory store and a directory-backed store ship
//! with the crate.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::error::EngineError;

/// Storage key of the analysis stats blob
pub const STATS_KEY: &str = "@RedeSegura:aiStats";

/// Storage key of the learning journal blob
pub const JOURNAL_KEY: &str = "@RedeSegura:aiLearningData";

/// Asynchronous string key-value store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>, EngineError>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<(), EngineError>;

    /// Delete a value; absent keys are not an error
    async fn remove(&self, key: &str) -> Result<(), EngineError>;
}

/// Process-local store, mostly for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), EngineError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), EngineError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing a key; characters outside `[A-Za-z0-9_-]` become `_`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{name}.json"))
    }
}

fn persistence_error(action: &str, path: &Path, err: std::io::Error) -> EngineError {
    EngineError::PersistenceFailure(format!("{action} {}: {err}", path.display()))
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, EngineError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(persistence_error("read", &path, err)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), EngineError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| persistence_error("create", &self.root, e))?;
        let path = self.path_for(key);
        tokio::fs::write(&path, value)
            .await
            .map_err(|e| persistence_error("write", &path, e))
    }

    async fn remove(&self, key: &str) -> Result<(), EngineError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(persistence_error("remove", &path, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_memory_store_crud() {
        let store = MemoryStore::new();
        assert_eq!(store.get(STATS_KEY).await.unwrap(), None);

        store.set(STATS_KEY, "{}").await.unwrap();
        assert_eq!(store.get(STATS_KEY).await.unwrap(), Some("{}".to_string()));
        assert_eq!(store.len().await, 1);

        store.remove(STATS_KEY).await.unwrap();
        store.remove(STATS_KEY).await.unwrap();
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_file_store_key_paths() {
        let store = FileStore::new("/tmp/state");
        assert_eq!(
            store.path_for(STATS_KEY),
            PathBuf::from("/tmp/state/_RedeSegura_aiStats.json")
        );
        assert_eq!(
            store.path_for(JOURNAL_KEY),
            PathBuf::from("/tmp/state/_RedeSegura_aiLearningData.json")
        );
    }

    #[tokio::test]
    async fn test_file_store_crud() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get(JOURNAL_KEY).await.unwrap(), None);
        store.set(JOURNAL_KEY, "[]").await.unwrap();
        assert_eq!(store.get(JOURNAL_KEY).await.unwrap(), Some("[]".to_string()));

        store.remove(JOURNAL_KEY).await.unwrap();
        assert_eq!(store.get(JOURNAL_KEY).await.unwrap(), None);
        store.remove(JOURNAL_KEY).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_store_reports_write_failures() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let store = FileStore::new(&blocker);
        let err = store.set(STATS_KEY, "{}").await.unwrap_err();
        assert!(matches!(err, EngineError::PersistenceFailure(_)));
    }
}
