//! `datalens datasets`: Manage stored datasets.

use std::path::Path;

use chrono::Utc;
use datalens_storage::{Dataset, DatasetCatalog, DatasetKind};
use serde::Deserialize;
use serde_json::Value;

use super::{CommandResult, load_config, open_store};

/// One dataset as written in an import file.
#[derive(Debug, Deserialize)]
pub(crate) struct DatasetFile {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type")]
    kind: DatasetKind,
    #[serde(default)]
    source: String,
    data: Value,
}

impl DatasetFile {
    fn into_parts(self) -> (Dataset, Value) {
        let dataset = Dataset {
            id: self.id,
            name: self.name,
            description: self.description,
            kind: self.kind,
            source: self.source,
            last_updated: Utc::now(),
        };
        (dataset, self.data)
    }
}

/// Accepts a single dataset object or an array of them.
pub(crate) fn parse_import(content: &str) -> Result<Vec<DatasetFile>, serde_json::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ImportFile {
        Many(Vec<DatasetFile>),
        One(DatasetFile),
    }

    Ok(match serde_json::from_str(content)? {
        ImportFile::Many(files) => files,
        ImportFile::One(file) => vec![file],
    })
}

fn catalog(config_path: Option<&Path>) -> Result<DatasetCatalog, Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    Ok(DatasetCatalog::new(open_store(&config)))
}

pub async fn list(config_path: Option<&Path>) -> CommandResult {
    let datasets = catalog(config_path)?.list().await?;

    if datasets.is_empty() {
        println!("No datasets. Import one with `datalens datasets import <file>`.");
        return Ok(());
    }

    println!("  {:<20} {:<12} {:<25} {}", "ID", "TYPE", "UPDATED", "NAME");
    for d in datasets {
        println!(
            "  {:<20} {:<12} {:<25} {}",
            d.id,
            d.kind.as_str(),
            d.last_updated.format("%Y-%m-%d %H:%M:%S UTC"),
            d.name
        );
    }
    Ok(())
}

pub async fn show(config_path: Option<&Path>, id: &str) -> CommandResult {
    let stored = catalog(config_path)?.get(id).await?;
    println!("{}", serde_json::to_string_pretty(&stored)?);
    Ok(())
}

pub async fn import(config_path: Option<&Path>, file: &Path) -> CommandResult {
    let content = std::fs::read_to_string(file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    let files = parse_import(&content)
        .map_err(|e| format!("{} is not a valid dataset file: {e}", file.display()))?;

    let catalog = catalog(config_path)?;
    for entry in files {
        let (dataset, data) = entry.into_parts();
        let saved = catalog.upload(dataset, data).await?;
        println!("Imported dataset '{}' ({})", saved.id, saved.name);
    }
    Ok(())
}

pub async fn delete(config_path: Option<&Path>, id: &str) -> CommandResult {
    catalog(config_path)?.delete(id).await?;
    println!("Deleted dataset '{id}'");
    Ok(())
}
