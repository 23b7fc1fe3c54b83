//! Provider registry: maps configured names to adapters.
//!
//! Built once at startup; the query pipeline resolves the provider named in
//! each request through it.

use std::collections::BTreeMap;
use std::sync::Arc;

use datalens_config::AppConfig;
use datalens_core::error::Error;
use datalens_core::provider::{Provider, ProviderKind};
use tracing::debug;

use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;
use crate::vertex::VertexProvider;

/// A provider together with the model it should be asked for.
#[derive(Clone)]
pub struct ResolvedProvider {
    pub name: String,
    pub provider: Arc<dyn Provider>,
    pub model: String,
}

/// Name → provider lookup.
pub struct ProviderRegistry {
    providers: BTreeMap<String, ResolvedProvider>,
    default_provider: String,
}

impl ProviderRegistry {
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: BTreeMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider under `name`, replacing any previous entry.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
    ) {
        let name = name.into();
        self.providers.insert(
            name.clone(),
            ResolvedProvider {
                name,
                provider,
                model: model.into(),
            },
        );
    }

    /// Look up a provider by name.
    pub fn resolve(&self, name: &str) -> Result<ResolvedProvider, Error> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownProvider(name.to_string()))
    }

    pub fn default_name(&self) -> &str {
        &self.default_provider
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(|s| s.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedProvider> {
        self.providers.values()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Build one adapter per configured provider entry.
pub fn build_from_config(config: &AppConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let provider: Arc<dyn Provider> = match provider_config.kind {
            ProviderKind::Ollama => Arc::new(OllamaProvider::new(
                name,
                provider_config.api_url.as_deref(),
                provider_config.timeout_secs,
            )),
            ProviderKind::Vertex => {
                let mut p = VertexProvider::new(
                    name,
                    provider_config.project.clone(),
                    provider_config.location.clone(),
                    provider_config.api_key.clone(),
                )
                .with_timeout(provider_config.timeout_secs);
                if let Some(url) = &provider_config.api_url {
                    p = p.with_base_url(url);
                }
                Arc::new(p)
            }
            ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(
                name,
                provider_config.api_url.as_deref(),
                provider_config.api_key.clone(),
                provider_config.timeout_secs,
            )),
        };

        debug!(provider = %name, kind = %provider_config.kind, model = %provider_config.model, "Registered provider");
        registry.register(name.clone(), provider, provider_config.model.clone());
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalens_config::ProviderConfig;
    use datalens_core::error::ProviderError;
    use datalens_core::provider::{Generation, GenerationRequest};

    struct EchoProvider;

    #[async_trait::async_trait]
    impl Provider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::Ollama
        }

        async fn generate(&self, request: GenerationRequest) -> Result<Generation, ProviderError> {
            Ok(Generation {
                text: request.messages.len().to_string(),
                model: request.model,
            })
        }
    }

    #[test]
    fn register_and_resolve() {
        let mut registry = ProviderRegistry::new("echo");
        registry.register("echo", Arc::new(EchoProvider), "tiny");

        let resolved = registry.resolve("echo").unwrap();
        assert_eq!(resolved.name, "echo");
        assert_eq!(resolved.model, "tiny");
        assert_eq!(registry.default_name(), "echo");
    }

    #[test]
    fn unknown_name_is_rejected() {
        let registry = ProviderRegistry::new("ollama");
        let err = registry.resolve("claude").err().unwrap();
        assert!(matches!(err, Error::UnknownProvider(ref n) if n == "claude"));
        assert!(registry.is_empty());
    }

    #[test]
    fn build_from_default_config() {
        let registry = build_from_config(&AppConfig::default());
        assert_eq!(registry.names(), vec!["ollama", "openai", "vertex"]);

        let vertex = registry.resolve("vertex").unwrap();
        assert_eq!(vertex.provider.kind(), ProviderKind::Vertex);
        assert_eq!(vertex.model, "gemini-pro");
        assert_eq!(registry.resolve("ollama").unwrap().model, "llama3");
    }

    #[test]
    fn custom_entries_use_their_kind() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "local-mistral".into(),
            ProviderConfig::new(ProviderKind::Ollama, "mistral"),
        );

        let registry = build_from_config(&config);
        let resolved = registry.resolve("local-mistral").unwrap();
        assert_eq!(resolved.provider.name(), "local-mistral");
        assert_eq!(resolved.provider.kind(), ProviderKind::Ollama);
        assert_eq!(registry.len(), 4);
    }
}
