//! `datalens providers`: List configured providers and check each one.

use std::path::Path;

use datalens_providers::ProviderRegistry;

use super::{CommandResult, load_config};

pub async fn run(config_path: Option<&Path>) -> CommandResult {
    let config = load_config(config_path)?;
    let registry = datalens_providers::build_from_config(&config);

    println!("Configured providers");
    println!("====================");
    println!();
    for line in status_lines(&registry).await {
        println!("  {line}");
    }
    println!();
    println!("  Environment variables:");
    println!("    DATALENS_PROVIDER, OLLAMA_HOST, OPENAI_API_KEY");
    println!("    GOOGLE_CLOUD_PROJECT, GOOGLE_CLOUD_LOCATION, GOOGLE_CLOUD_ACCESS_TOKEN");

    Ok(())
}

/// One formatted row per provider, default marked with `*`.
pub(crate) async fn status_lines(registry: &ProviderRegistry) -> Vec<String> {
    let mut lines = Vec::with_capacity(registry.len());
    for entry in registry.iter() {
        let status = match entry.provider.health_check().await {
            Ok(true) => "ready".to_string(),
            Ok(false) => "not ready".to_string(),
            Err(e) => format!("unreachable ({e})"),
        };
        let marker = if entry.name == registry.default_name() { "*" } else { " " };
        lines.push(format!(
            "{marker} {:<16} {:<8} {:<20} {status}",
            entry.name,
            entry.provider.kind().as_str(),
            entry.model
        ));
    }
    lines
}
