//! Provider trait: the abstraction over language-model backends.
//!
//! A Provider takes an ordered message list plus sampling parameters and
//! returns the generated text. It is stateless: history lives with the
//! caller, and each call carries everything the backend needs.
//!
//! Implementations: Ollama (local), Vertex AI (managed cloud), OpenAI (hosted API).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;

/// The closed set of backend families a provider can wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    /// A locally hosted Ollama server
    #[serde(rename = "ollama")]
    Ollama,
    /// Google Vertex AI (Gemini models)
    #[serde(rename = "vertex")]
    Vertex,
    /// The OpenAI chat completions API
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::Vertex => "vertex",
            ProviderKind::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The model to use (e.g., "llama3", "gemini-pro", "gpt-4")
    pub model: String,

    /// The conversation messages, oldest first
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

impl GenerationRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: default_temperature(),
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// The plain-text result of a generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    /// Generated text. May be empty if the backend returned no content.
    pub text: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// The core Provider trait.
///
/// Every backend translates the generic message list into its own request
/// shape and extracts plain text from its own response shape. Failures of
/// any kind come back as a [`ProviderError`].
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "ollama", "vertex").
    fn name(&self) -> &str;

    /// Which backend family this provider talks to.
    fn kind(&self) -> ProviderKind;

    /// Send a request and get the complete generated text.
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<Generation, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
