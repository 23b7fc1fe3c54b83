//! Configuration loading, validation, and management for DataLens.
//!
//! Loads configuration from `~/.datalens/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use datalens_core::ProviderKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.datalens/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider used when a request does not name one
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Maximum number of messages kept per session
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Sampling parameters for chat turns
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Assistant persona settings
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Blob storage for charts and datasets
    #[serde(default)]
    pub storage: StorageConfig,

    /// Named provider entries
    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "ollama".into()
}
fn default_history_window() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output cap for the answer call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Output cap for the follow-up questions call
    #[serde(default = "default_follow_up_max_tokens")]
    pub follow_up_max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    500
}
fn default_follow_up_max_tokens() -> u32 {
    150
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            follow_up_max_tokens: default_follow_up_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Replace the built-in analyst persona
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Root directory for the file backend
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("storage")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            root: default_storage_root(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,

    pub model: String,

    /// API key (OpenAI) or OAuth access token (Vertex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Google Cloud project (Vertex only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Google Cloud region (Vertex only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// HTTP timeout; unset means no client-side timeout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
            api_key: None,
            api_url: None,
            project: None,
            location: None,
            timeout_secs: None,
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("project", &self.project)
            .field("location", &self.location)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_providers() -> BTreeMap<String, ProviderConfig> {
    let mut providers = BTreeMap::new();
    providers.insert(
        "ollama".to_string(),
        ProviderConfig::new(ProviderKind::Ollama, "llama3"),
    );
    providers.insert(
        "vertex".to_string(),
        ProviderConfig {
            location: Some("us-central1".into()),
            ..ProviderConfig::new(ProviderKind::Vertex, "gemini-pro")
        },
    );
    providers.insert(
        "openai".to_string(),
        ProviderConfig::new(ProviderKind::OpenAi, "gpt-4"),
    );
    providers
}

impl AppConfig {
    /// Load configuration from `path`, or from `~/.datalens/config.toml`
    /// when no path is given, then apply environment overrides:
    ///
    /// - `DATALENS_PROVIDER`, `DATALENS_STORAGE_DIR`
    /// - `OPENAI_API_KEY` (OpenAI entries without a key)
    /// - `GOOGLE_CLOUD_PROJECT`, `GOOGLE_CLOUD_LOCATION`,
    ///   `GOOGLE_CLOUD_ACCESS_TOKEN` (Vertex entries)
    /// - `OLLAMA_HOST` (Ollama entries without a URL)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(path.unwrap_or(&default_path))?;
        config.apply_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("DATALENS_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(root) = lookup("DATALENS_STORAGE_DIR") {
            self.storage.root = PathBuf::from(root);
        }

        let openai_key = lookup("OPENAI_API_KEY");
        let project = lookup("GOOGLE_CLOUD_PROJECT");
        let location = lookup("GOOGLE_CLOUD_LOCATION");
        let access_token = lookup("GOOGLE_CLOUD_ACCESS_TOKEN");
        let ollama_host = lookup("OLLAMA_HOST");

        for provider in self.providers.values_mut() {
            match provider.kind {
                ProviderKind::OpenAi => {
                    if provider.api_key.is_none() {
                        provider.api_key = openai_key.clone();
                    }
                }
                ProviderKind::Vertex => {
                    if provider.project.is_none() {
                        provider.project = project.clone();
                    }
                    if let Some(ref loc) = location {
                        provider.location = Some(loc.clone());
                    }
                    if provider.api_key.is_none() {
                        provider.api_key = access_token.clone();
                    }
                }
                ProviderKind::Ollama => {
                    if provider.api_url.is_none() {
                        provider.api_url = ollama_host.clone();
                    }
                }
            }
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".datalens")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation.temperature < 0.0 || self.generation.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.generation.max_tokens == 0 || self.generation.follow_up_max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "generation token caps must be > 0".into(),
            ));
        }

        if self.history_window == 0 {
            return Err(ConfigError::ValidationError(
                "history_window must be at least 1".into(),
            ));
        }

        if !self.providers.contains_key(&self.default_provider) {
            return Err(ConfigError::ValidationError(format!(
                "default_provider '{}' is not defined under [providers]",
                self.default_provider
            )));
        }

        if let Some((name, _)) = self.providers.iter().find(|(_, p)| p.model.trim().is_empty()) {
            return Err(ConfigError::ValidationError(format!(
                "provider '{name}' has an empty model"
            )));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            history_window: default_history_window(),
            generation: GenerationConfig::default(),
            assistant: AssistantConfig::default(),
            storage: StorageConfig::default(),
            providers: default_providers(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for datalens_core::Error {
    fn from(e: ConfigError) -> Self {
        datalens_core::Error::Config {
            message: e.to_string(),
        }
    }
}
