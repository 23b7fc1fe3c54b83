//! Dataset catalog: named tabular datasets kept in blob storage.
//!
//! Each dataset is one document under `datasets/<id>` holding its metadata
//! and its raw `data` array (the same point objects the chart pipeline
//! accepts).

use chrono::{DateTime, Utc};
use datalens_core::storage::{BlobStore, DATASETS_PREFIX, validate_key};
use datalens_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// What shape of data a dataset holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatasetKind {
    TimeSeries,
    Tabular,
    Categorical,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::TimeSeries => "time-series",
            DatasetKind::Tabular => "tabular",
            DatasetKind::Categorical => "categorical",
        }
    }
}

/// Dataset metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: DatasetKind,
    #[serde(default)]
    pub source: String,
    pub last_updated: DateTime<Utc>,
}

/// A dataset document as stored: metadata plus its raw points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDataset {
    #[serde(flatten)]
    pub dataset: Dataset,
    pub data: serde_json::Value,
}

/// CRUD over datasets in a [`BlobStore`].
#[derive(Clone)]
pub struct DatasetCatalog {
    store: Arc<dyn BlobStore>,
}

impl DatasetCatalog {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    fn key(id: &str) -> Result<String> {
        if id.contains('/') {
            return Err(Error::InvalidInput(format!(
                "dataset id '{id}' must not contain '/'"
            )));
        }
        let key = format!("{DATASETS_PREFIX}{id}");
        validate_key(&key)?;
        Ok(key)
    }

    /// Metadata for every stored dataset. Unreadable documents are skipped.
    pub async fn list(&self) -> Result<Vec<Dataset>> {
        let keys = self.store.list(DATASETS_PREFIX).await?;
        let mut datasets = Vec::with_capacity(keys.len());

        for key in keys {
            let value = match self.store.get(&key).await {
                Ok(v) => v,
                Err(e) => {
                    warn!(key = %key, error = %e, "Skipping unreadable dataset");
                    continue;
                }
            };
            match serde_json::from_value::<StoredDataset>(value) {
                Ok(stored) => datasets.push(stored.dataset),
                Err(e) => warn!(key = %key, error = %e, "Skipping malformed dataset"),
            }
        }

        Ok(datasets)
    }

    /// The full stored document.
    pub async fn get(&self, id: &str) -> Result<StoredDataset> {
        let value = self.store.get(&Self::key(id)?).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Store (or replace) a dataset, stamping `last_updated` with the current time.
    pub async fn upload(&self, mut dataset: Dataset, data: serde_json::Value) -> Result<Dataset> {
        let key = Self::key(&dataset.id)?;
        dataset.last_updated = Utc::now();

        let stored = StoredDataset {
            dataset: dataset.clone(),
            data,
        };
        self.store.put(&key, &serde_json::to_value(&stored)?).await?;

        info!(dataset = %dataset.id, "Dataset uploaded");
        Ok(dataset)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(&Self::key(id)?).await?;
        info!(dataset = %id, "Dataset deleted");
        Ok(())
    }
}
