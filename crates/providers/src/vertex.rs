//! Vertex AI provider: Gemini models on Google Cloud.
//!
//! Requests go to the `generateContent` method of a publisher model.
//! System messages become `systemInstruction`; assistant turns use the
//! Gemini role name `model`.

use async_trait::async_trait;
use datalens_core::error::ProviderError;
use datalens_core::message::{Message, Role};
use datalens_core::provider::{Generation, GenerationRequest, Provider, ProviderKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{check_status, http_client, transport_error};

pub const DEFAULT_LOCATION: &str = "us-central1";

const TOP_P: f32 = 0.8;
const TOP_K: u32 = 40;

pub struct VertexProvider {
    name: String,
    base_url: String,
    project: Option<String>,
    location: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl VertexProvider {
    pub fn new(
        name: impl Into<String>,
        project: Option<String>,
        location: Option<String>,
        access_token: Option<String>,
    ) -> Self {
        let location = location.unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        Self {
            name: name.into(),
            base_url: format!("https://{location}-aiplatform.googleapis.com"),
            project,
            location,
            access_token,
            client: http_client(None),
        }
    }

    /// Override the API endpoint (regional endpoint, proxy, or test server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.client = http_client(timeout_secs);
        self
    }

    fn endpoint(&self, project: &str, model: &str) -> String {
        format!(
            "{}/v1/projects/{project}/locations/{}/publishers/google/models/{model}:generateContent",
            self.base_url, self.location
        )
    }

    fn build_body(request: &GenerationRequest) -> GenerateContentRequest {
        let system_text: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let system_instruction = (!system_text.is_empty()).then(|| Content {
            role: None,
            parts: vec![Part {
                text: Some(system_text.join("\n\n")),
            }],
        });

        GenerateContentRequest {
            contents: Self::to_contents(&request.messages),
            system_instruction,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                top_p: TOP_P,
                top_k: TOP_K,
            },
        }
    }

    fn to_contents(messages: &[Message]) -> Vec<Content> {
        messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| Content {
                role: Some(
                    match m.role {
                        Role::Assistant => "model",
                        _ => "user",
                    }
                    .into(),
                ),
                parts: vec![Part {
                    text: Some(m.content.clone()),
                }],
            })
            .collect()
    }

    fn extract_text(response: GenerateContentResponse) -> String {
        response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for VertexProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Vertex
    }

    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> std::result::Result<Generation, ProviderError> {
        let project = self.project.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "provider '{}' has no Google Cloud project (set GOOGLE_CLOUD_PROJECT)",
                self.name
            ))
        })?;

        let url = self.endpoint(project, &request.model);
        let body = Self::build_body(&request);

        debug!(provider = %self.name, model = %request.model, location = %self.location, "Sending generateContent request");

        let mut builder = self.client.post(&url).json(&body);
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let response = check_status(&self.name, response).await?;

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        let model = api_response
            .model_version
            .clone()
            .unwrap_or_else(|| request.model.clone());

        Ok(Generation {
            text: Self::extract_text(api_response),
            model,
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(self.project.is_some() && self.access_token.is_some())
    }
}

// --- Gemini wire types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    top_p: f32,
    top_k: u32,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
