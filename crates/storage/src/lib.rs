//! Blob storage implementations for DataLens.
//!
//! All stores implement `datalens_core::BlobStore`. Charts are written
//! under `charts/`, datasets under `datasets/`.

pub mod datasets;
pub mod file_backend;
pub mod in_memory;

pub use datasets::{Dataset, DatasetCatalog, DatasetKind, StoredDataset};
pub use file_backend::FileBlobStore;
pub use in_memory::InMemoryBlobStore;

use datalens_config::{StorageBackend, StorageConfig};
use datalens_core::BlobStore;
use std::sync::Arc;

/// Build the configured blob store.
pub fn build_from_config(config: &StorageConfig) -> Arc<dyn BlobStore> {
    match config.backend {
        StorageBackend::File => Arc::new(FileBlobStore::new(config.root.clone())),
        StorageBackend::Memory => Arc::new(InMemoryBlobStore::new()),
    }
}
