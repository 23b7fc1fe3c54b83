//! `datalens config`: Configuration management commands.

use std::path::{Path, PathBuf};

use datalens_config::AppConfig;

use super::CommandResult;

const REDACTED: &str = "[REDACTED]";

fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

pub async fn validate(path: Option<&Path>) -> CommandResult {
    let file = config_file(path);
    println!("Validating {}...", file.display());

    match AppConfig::load(Some(file.as_path())) {
        Ok(config) => {
            println!("   Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   warning: {w}");
                }
            }

            println!();
            println!("   Provider:  {}", config.default_provider);
            println!("   Window:    {} messages", config.history_window);
            println!("   Storage:   {:?} at {}", config.storage.backend, config.storage.root.display());
            println!("   Providers: {}", config.providers.len());
        }
        Err(e) => {
            println!("   Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Non-fatal problems: providers that will fail at request time.
pub(crate) fn warnings(config: &AppConfig) -> Vec<String> {
    use datalens_core::ProviderKind;

    let mut warnings = Vec::new();
    for (name, p) in &config.providers {
        match p.kind {
            ProviderKind::OpenAi if p.api_key.is_none() => {
                warnings.push(format!("provider '{name}' has no API key (set OPENAI_API_KEY)"));
            }
            ProviderKind::Vertex if p.project.is_none() => {
                warnings.push(format!(
                    "provider '{name}' has no project (set GOOGLE_CLOUD_PROJECT)"
                ));
            }
            _ => {}
        }
    }
    warnings
}

pub async fn show(path: Option<&Path>) -> CommandResult {
    let config = AppConfig::load(path).map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", redacted_toml(&config)?);
    Ok(())
}

pub(crate) fn redacted_toml(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut config = config.clone();
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some(REDACTED.into());
        }
    }
    toml::to_string_pretty(&config)
}

pub async fn init(path: Option<&Path>, force: bool) -> CommandResult {
    let file = config_file(path);
    if write_default(&file, force)? {
        println!("Wrote default configuration to {}", file.display());
    } else {
        println!("{} already exists (use --force to overwrite)", file.display());
    }
    Ok(())
}

/// Write the default config to `file`. Returns `false` when the file exists
/// and `force` is not set.
pub(crate) fn write_default(file: &Path, force: bool) -> std::io::Result<bool> {
    if file.exists() && !force {
        return Ok(false);
    }
    if let Some(dir) = file.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(file, AppConfig::default_toml())?;
    Ok(true)
}

pub async fn path(path: Option<&Path>) -> CommandResult {
    println!("{}", config_file(path).display());
    Ok(())
}
