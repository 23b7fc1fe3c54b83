//! Chart transformer: raw points in, renderable chart descriptor out.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use datalens_core::error::{Error, Result};
use datalens_core::storage::{BlobStore, CHARTS_PREFIX};
use datalens_storage::DatasetCatalog;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::options::{merge_options, titled};
use crate::schema::ChartType;

/// A validated chart: header row plus data rows, and merged options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescriptor {
    id: String,
    #[serde(rename = "type")]
    chart_type: ChartType,
    rows: Vec<Vec<Value>>,
    options: Value,
}

impl ChartDescriptor {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    /// `rows()[0]` is the header row.
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn data_rows(&self) -> &[Vec<Value>] {
        self.rows.get(1..).unwrap_or_default()
    }

    pub fn options(&self) -> &Value {
        &self.options
    }

    pub fn title(&self) -> Option<&str> {
        self.options.get("title").and_then(Value::as_str)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMetadata {
    chart_type: ChartType,
    timestamp: DateTime<Utc>,
}

/// The persisted form of a chart.
#[derive(Serialize, Deserialize)]
struct StoredChart {
    #[serde(flatten)]
    chart: ChartDescriptor,
    metadata: ChartMetadata,
}

pub struct ChartTransformer {
    store: Arc<dyn BlobStore>,
}

impl ChartTransformer {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Validate `raw_data`, build rows and options, and persist the result.
    ///
    /// Validation happens before anything is written. A failed write is
    /// logged and the descriptor is still returned.
    pub async fn generate(
        &self,
        raw_data: &Value,
        chart_type: ChartType,
        options: Option<&Value>,
    ) -> Result<ChartDescriptor> {
        let (rows, options) = build(raw_data, chart_type, options)?;

        let descriptor = ChartDescriptor {
            id: new_chart_id(),
            chart_type,
            rows,
            options,
        };

        self.persist(&descriptor).await;
        info!(
            chart = %descriptor.id,
            chart_type = %chart_type,
            points = descriptor.data_rows().len(),
            "Chart generated"
        );
        Ok(descriptor)
    }

    /// Chart a stored dataset's points.
    pub async fn generate_from_dataset(
        &self,
        dataset_id: &str,
        chart_type: ChartType,
    ) -> Result<ChartDescriptor> {
        let catalog = DatasetCatalog::new(Arc::clone(&self.store));
        let stored = catalog.get(dataset_id).await?;
        let options = titled(&format!("Visualization of {dataset_id}"));
        self.generate(&stored.data, chart_type, Some(&options)).await
    }

    /// Read a previously generated chart.
    pub async fn load(&self, id: &str) -> Result<ChartDescriptor> {
        if id.contains('/') {
            return Err(Error::InvalidInput(format!("chart id '{id}' must not contain '/'")));
        }
        let value = self.store.get(&format!("{CHARTS_PREFIX}{id}")).await?;
        let stored: StoredChart = serde_json::from_value(value)?;
        Ok(stored.chart)
    }

    /// Ids of stored charts, oldest first.
    pub async fn list(&self) -> Result<Vec<String>> {
        let keys = self.store.list(CHARTS_PREFIX).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(CHARTS_PREFIX).map(String::from))
            .collect())
    }

    async fn persist(&self, descriptor: &ChartDescriptor) {
        let stored = StoredChart {
            chart: descriptor.clone(),
            metadata: ChartMetadata {
                chart_type: descriptor.chart_type,
                timestamp: Utc::now(),
            },
        };
        let key = format!("{CHARTS_PREFIX}{}", descriptor.id);

        let result = match serde_json::to_value(&stored) {
            Ok(value) => self.store.put(&key, &value).await.map_err(Error::StoragePersistFailure),
            Err(e) => Err(Error::Serialization(e)),
        };

        match result {
            Ok(()) => debug!(chart = %descriptor.id, store = self.store.name(), "Chart stored"),
            Err(e) => warn!(chart = %descriptor.id, error = %e, "Chart not persisted"),
        }
    }
}

/// Validate and shape the input. Pure: same input, same rows and options.
pub fn build(
    raw_data: &Value,
    chart_type: ChartType,
    options: Option<&Value>,
) -> Result<(Vec<Vec<Value>>, Value)> {
    let points = match raw_data.as_array() {
        Some(points) if !points.is_empty() => points,
        _ => return Err(Error::EmptyDataset),
    };

    let mut rows = Vec::with_capacity(points.len() + 1);
    rows.push(
        chart_type
            .header()
            .iter()
            .map(|h| Value::String((*h).to_string()))
            .collect(),
    );
    for (index, point) in points.iter().enumerate() {
        rows.push(chart_type.project(index, point)?);
    }

    let options = merge_options(chart_type, options)?;
    Ok((rows, options))
}

/// `<unix-millis>-<8 hex>`: sortable by creation time, unique within a millisecond.
fn new_chart_id() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use datalens_core::error::StorageError;
    use datalens_storage::{Dataset, DatasetKind, InMemoryBlobStore};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts writes and optionally refuses them.
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryBlobStore,
        puts: AtomicUsize,
        fail_puts: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                fail_puts: true,
                ..Self::default()
            }
        }

        fn puts(&self) -> usize {
            self.puts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BlobStore for RecordingStore {
        fn name(&self) -> &str {
            "recording"
        }

        async fn put(&self, key: &str, value: &Value) -> std::result::Result<(), StorageError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            if self.fail_puts {
                return Err(StorageError::Io {
                    key: key.into(),
                    reason: "disk full".into(),
                });
            }
            self.inner.put(key, value).await
        }

        async fn get(&self, key: &str) -> std::result::Result<Value, StorageError> {
            self.inner.get(key).await
        }

        async fn list(&self, prefix: &str) -> std::result::Result<Vec<String>, StorageError> {
            self.inner.list(prefix).await
        }

        async fn delete(&self, key: &str) -> std::result::Result<(), StorageError> {
            self.inner.delete(key).await
        }
    }

    #[tokio::test]
    async fn pie_rows_have_header_then_points() {
        let transformer = ChartTransformer::new(Arc::new(InMemoryBlobStore::new()));
        let data = json!([{"label": "A", "value": 30}, {"label": "B", "value": 70}]);

        let chart = transformer.generate(&data, ChartType::Pie, None).await.unwrap();

        assert_eq!(
            chart.rows(),
            &[
                vec![json!("Label"), json!("Value")],
                vec![json!("A"), json!(30)],
                vec![json!("B"), json!(70)],
            ]
        );
        assert_eq!(chart.options()["pieHole"], 0.4);
        assert_eq!(chart.title(), Some("Data Visualization"));
        assert_eq!(chart.chart_type(), ChartType::Pie);
    }

    #[tokio::test]
    async fn scatter_with_text_x_fails_without_persisting() {
        let store = Arc::new(RecordingStore::default());
        let transformer = ChartTransformer::new(store.clone());
        let data = json!([{"x": 1, "y": 2}, {"x": "a", "y": 2}]);

        let err = transformer.generate(&data, ChartType::Scatter, None).await.unwrap_err();

        assert!(matches!(
            err,
            Error::InvalidDataPoint { index: 1, ref field, .. } if field == "x"
        ));
        assert_eq!(store.puts(), 0);
    }

    #[tokio::test]
    async fn empty_or_non_array_input_rejected() {
        let store = Arc::new(RecordingStore::default());
        let transformer = ChartTransformer::new(store.clone());

        for data in [json!([]), json!({"x": 1}), json!(null), json!("points")] {
            let err = transformer.generate(&data, ChartType::Line, None).await.unwrap_err();
            assert!(matches!(err, Error::EmptyDataset), "{data}");
        }
        assert_eq!(store.puts(), 0);
    }

    #[tokio::test]
    async fn bad_options_rejected_before_persisting() {
        let store = Arc::new(RecordingStore::default());
        let transformer = ChartTransformer::new(store.clone());
        let data = json!([{"category": "A", "value": 1}]);

        let err = transformer
            .generate(&data, ChartType::Bar, Some(&json!("wide")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(store.puts(), 0);
    }

    #[tokio::test]
    async fn caller_options_override_defaults() {
        let transformer = ChartTransformer::new(Arc::new(InMemoryBlobStore::new()));
        let data = json!([{"category": "A", "value": 1}]);
        let options = json!({"fontSize": 16, "title": "Sales"});

        let chart = transformer
            .generate(&data, ChartType::Bar, Some(&options))
            .await
            .unwrap();

        assert_eq!(chart.options()["fontSize"], 16);
        assert_eq!(chart.title(), Some("Sales"));
        assert_eq!(chart.options()["bars"], "vertical");
    }

    #[tokio::test]
    async fn generation_is_deterministic_apart_from_id() {
        let transformer = ChartTransformer::new(Arc::new(InMemoryBlobStore::new()));
        let data = json!([{"x": "Mon", "y": 3, "label": "peak"}, {"x": "Tue", "y": 1}]);

        let a = transformer.generate(&data, ChartType::Line, None).await.unwrap();
        let b = transformer.generate(&data, ChartType::Line, None).await.unwrap();

        assert_eq!(a.rows(), b.rows());
        assert_eq!(a.options(), b.options());
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn persisted_chart_loads_back_with_metadata() {
        let store = Arc::new(InMemoryBlobStore::new());
        let transformer = ChartTransformer::new(store.clone());
        let data = json!([{"x": 1.5, "y": 2}]);

        let chart = transformer.generate(&data, ChartType::Scatter, None).await.unwrap();

        let raw = store.get(&format!("charts/{}", chart.id())).await.unwrap();
        assert_eq!(raw["metadata"]["chartType"], "scatter");
        assert_eq!(raw["type"], "scatter");

        assert_eq!(transformer.load(chart.id()).await.unwrap(), chart);
        assert_eq!(transformer.list().await.unwrap(), vec![chart.id().to_string()]);
    }

    #[tokio::test]
    async fn storage_failure_still_returns_descriptor() {
        let store = Arc::new(RecordingStore::failing());
        let transformer = ChartTransformer::new(store.clone());
        let data = json!([{"label": "A", "value": 1}]);

        let chart = transformer.generate(&data, ChartType::Pie, None).await.unwrap();
        assert_eq!(chart.data_rows().len(), 1);
        assert_eq!(store.puts(), 1);
        assert!(transformer.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dataset_charts_are_titled_after_dataset() {
        let store: Arc<dyn BlobStore> = Arc::new(InMemoryBlobStore::new());
        let catalog = DatasetCatalog::new(Arc::clone(&store));
        catalog
            .upload(
                Dataset {
                    id: "regions".into(),
                    name: "Sales by region".into(),
                    description: String::new(),
                    kind: DatasetKind::Categorical,
                    source: "internal".into(),
                    last_updated: Utc::now(),
                },
                json!([{"category": "EU", "value": 12}, {"category": "US", "value": 20}]),
            )
            .await
            .unwrap();

        let transformer = ChartTransformer::new(store);
        let chart = transformer
            .generate_from_dataset("regions", ChartType::Bar)
            .await
            .unwrap();
        assert_eq!(chart.title(), Some("Visualization of regions"));
        assert_eq!(chart.data_rows().len(), 2);

        let err = transformer
            .generate_from_dataset("missing", ChartType::Bar)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::NotFound(_))));
    }

    #[test]
    fn ids_are_millis_then_hex() {
        let id = new_chart_id();
        let (millis, hex) = id.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(hex.len(), 8);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
