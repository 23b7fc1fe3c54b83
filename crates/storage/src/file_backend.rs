//! File-based blob store: one pretty-printed JSON document per key.
//!
//! A key `charts/1718000000000-ab12cd34` lives at
//! `<root>/charts/1718000000000-ab12cd34.json`. The layout is human-inspectable
//! and needs no external services.
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! reader never sees a half-written document. Concurrent writers to the same
//! key race; the last rename wins.

use async_trait::async_trait;
use datalens_core::error::StorageError;
use datalens_core::storage::{BlobStore, validate_key};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const EXTENSION: &str = "json";

/// A directory-backed blob store.
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        debug!(root = %root.display(), "File blob store opened");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a validated key to its file path.
    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.{EXTENSION}")))
    }

    fn io_error(key: &str, e: std::io::Error) -> StorageError {
        if e.kind() == ErrorKind::NotFound {
            StorageError::NotFound(key.to_string())
        } else {
            StorageError::Io {
                key: key.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn put(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Self::io_error(key, e))?;
        }

        let content = serde_json::to_string_pretty(value).map_err(|e| StorageError::Io {
            key: key.to_string(),
            reason: format!("Failed to serialize value: {e}"),
        })?;

        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| Self::io_error(key, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Self::io_error(key, e))?;

        debug!(key, path = %path.display(), "Blob saved");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<serde_json::Value, StorageError> {
        let path = self.path_for(key)?;
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Self::io_error(key, e))?;

        serde_json::from_str(&content).map_err(|e| {
            warn!(key, error = %e, "Stored blob is not valid JSON");
            StorageError::Corrupted {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
    }

    /// Lists one directory level: `list("charts/")` returns every chart key,
    /// `list("charts/17")` only those whose id starts with `17`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let (dir, dir_path) = match prefix.rfind('/') {
            Some(idx) => {
                let dir = &prefix[..idx];
                validate_key(dir)?;
                (format!("{dir}/"), self.root.join(dir))
            }
            None => (String::new(), self.root.clone()),
        };

        let mut entries = match tokio::fs::read_dir(&dir_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Self::io_error(prefix, e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Self::io_error(prefix, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let key = format!("{dir}{stem}");
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| Self::io_error(key, e))?;
        debug!(key, "Blob deleted");
        Ok(())
    }
}
