//! Blob storage trait: the key/value store charts and datasets live in.
//!
//! Keys are `/`-separated relative paths such as `charts/1718000000000-ab12cd34`
//! or `datasets/global-temperature`. Values are JSON documents. Writes are
//! last-write-wins; there are no transactions.

use async_trait::async_trait;

use crate::error::StorageError;

/// Key prefix for stored chart descriptors.
pub const CHARTS_PREFIX: &str = "charts/";

/// Key prefix for stored datasets.
pub const DATASETS_PREFIX: &str = "datasets/";

/// The core BlobStore trait.
///
/// Implementations: file system, in-memory (for testing).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// The backend name (e.g., "file", "memory").
    fn name(&self) -> &str;

    /// Store a value, replacing whatever was under the key.
    async fn put(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError>;

    /// Read a value. Missing keys are `StorageError::NotFound`.
    async fn get(&self, key: &str) -> Result<serde_json::Value, StorageError>;

    /// List keys starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Delete a key. Missing keys are `StorageError::NotFound`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Validate a storage key.
///
/// Rejects empty keys, absolute keys, backslashes, and empty, `.` or `..`
/// segments, so a key can always be mapped below a storage root.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = |reason: &str| StorageError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.is_empty() {
        return Err(invalid("key is empty"));
    }
    if key.starts_with('/') {
        return Err(invalid("key must be relative"));
    }
    if key.contains('\\') {
        return Err(invalid("key must use '/' separators"));
    }
    for segment in key.split('/') {
        match segment {
            "" => return Err(invalid("key has an empty segment")),
            "." | ".." => return Err(invalid("path traversal segment")),
            _ => {}
        }
    }
    Ok(())
}
