//! services/app/src/adapters/store.rs
//!
//! Concrete implementations of the `KeyValueStore` port: a process-local map used
//! by tests and ephemeral runs, and a directory of JSON files standing in for the
//! device's persistent storage.

use adoption_core::ports::{KeyValueStore, PortError, PortResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

//=========================================================================================
// MemoryStore
//=========================================================================================

#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

//=========================================================================================
// FileStore
//=========================================================================================

/// Stores each key as `<root>/<key>.json`.
#[derive(Clone, Debug)]
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

    /// Keys are flattened to a safe file name: anything outside `[A-Za-z0-9_-]`
    /// becomes `_`.
    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{}.json", name))
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> PortError {
    PortError::Unexpected(format!("failed to {} {}: {}", action, path.display(), e))
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read", &path, e)),
        }
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_error("create", &self.root, e))?;

        // Write next to the target and rename so readers never see a torn value.
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value)
            .await
            .map_err(|e| io_error("write", &staging, e))?;
        fs::rename(&staging, &path)
            .await
            .map_err(|e| io_error("replace", &path, e))?;

        debug!(key, path = %path.display(), "stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips_and_removes() {
        let store = MemoryStore::new();
        assert_eq!(store.get("users").await.unwrap(), None);

        store.set("users", "[]".to_string()).await.unwrap();
        assert_eq!(store.get("users").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(store.len().await, 1);

        store.remove("users").await.unwrap();
        store.remove("users").await.unwrap();
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested");

        FileStore::new(&root)
            .set("current_user", r#"{"id":"1"}"#.to_string())
            .await
            .unwrap();

        let reopened = FileStore::new(&root);
        assert_eq!(
            reopened.get("current_user").await.unwrap().as_deref(),
            Some(r#"{"id":"1"}"#)
        );
        assert!(root.join("current_user.json").exists());
        assert!(!root.join("current_user.json.tmp").exists());
    }

    #[tokio::test]
    async fn file_store_missing_key_is_none_and_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("auth_token").await.unwrap(), None);
        store.remove("auth_token").await.unwrap();
    }

    #[test]
    fn file_names_are_sanitized() {
        let store = FileStore::new("/tmp/x");
        assert_eq!(
            store.path_for("@app:user/../x"),
            PathBuf::from("/tmp/x/_app_user____x.json")
        );
    }
}
