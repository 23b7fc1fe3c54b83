//! In-memory blob store: useful for testing and ephemeral deployments.

use async_trait::async_trait;
use datalens_core::error::StorageError;
use datalens_core::storage::{BlobStore, validate_key};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A blob store that keeps documents in a sorted map.
/// Contents vanish with the process.
#[derive(Clone, Default)]
pub struct InMemoryBlobStore {
    blobs: Arc<RwLock<BTreeMap<String, serde_json::Value>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
        validate_key(key)?;
        self.blobs.write().await.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<serde_json::Value, StorageError> {
        validate_key(key)?;
        self.blobs
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let blobs = self.blobs.read().await;
        Ok(blobs
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.blobs
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_get_delete() {
        let store = InMemoryBlobStore::new();
        store.put("charts/1", &json!({"type": "bar"})).await.unwrap();
        assert_eq!(store.get("charts/1").await.unwrap()["type"], "bar");
        assert_eq!(store.len().await, 1);

        store.delete("charts/1").await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(
            store.get("charts/1").await.unwrap_err(),
            StorageError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn list_filters_by_prefix_in_order() {
        let store = InMemoryBlobStore::new();
        store.put("datasets/b", &json!({})).await.unwrap();
        store.put("charts/2", &json!({})).await.unwrap();
        store.put("charts/1", &json!({})).await.unwrap();

        assert_eq!(store.list("charts/").await.unwrap(), vec!["charts/1", "charts/2"]);
        assert_eq!(store.list("datasets/").await.unwrap(), vec!["datasets/b"]);
        assert!(store.list("models/").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clones_share_contents() {
        let store = InMemoryBlobStore::new();
        let handle = store.clone();
        handle.put("charts/1", &json!({})).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn invalid_keys_rejected() {
        let store = InMemoryBlobStore::new();
        assert!(store.put("", &json!({})).await.is_err());
        assert!(store.put("a/../b", &json!({})).await.is_err());
    }
}
