//! Command implementations.

pub mod ask;
pub mod chart;
pub mod charts;
pub mod config_cmd;
pub mod datasets;
pub mod providers;

use std::path::Path;
use std::sync::Arc;

use datalens_config::AppConfig;
use datalens_core::BlobStore;
use tracing::debug;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load(path).map_err(|e| format!("Failed to load config: {e}"))?;
    debug!(
        default_provider = %config.default_provider,
        providers = config.providers.len(),
        storage = %config.storage.root.display(),
        "Configuration loaded"
    );
    Ok(config)
}

pub(crate) fn open_store(config: &AppConfig) -> Arc<dyn BlobStore> {
    datalens_storage::build_from_config(&config.storage)
}
