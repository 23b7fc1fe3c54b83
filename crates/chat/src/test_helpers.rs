//! Scripted providers for pipeline tests.

use datalens_core::error::ProviderError;
use datalens_core::provider::{Generation, GenerationRequest, Provider, ProviderKind};
use std::sync::Mutex;

/// Returns scripted replies in order and records every request.
///
/// Panics when called more often than it has replies, unless a trailing
/// failure was set with [`ScriptedProvider::then_fail`].
pub struct ScriptedProvider {
    replies: Vec<String>,
    trailing_error: Option<ProviderError>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: replies.into_iter().map(String::from).collect(),
            trailing_error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn then_fail(mut self, error: ProviderError) -> Self {
        self.trailing_error = Some(error);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Generation, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let call = requests.len();
        let model = request.model.clone();
        requests.push(request);

        match self.replies.get(call) {
            Some(text) => Ok(Generation {
                text: text.clone(),
                model,
            }),
            None => match &self.trailing_error {
                Some(e) => Err(e.clone()),
                None => panic!(
                    "ScriptedProvider: no more replies (call #{call}, have {})",
                    self.replies.len()
                ),
            },
        }
    }
}

/// Fails every call with the same error.
pub struct FailingProvider {
    error: ProviderError,
}

impl FailingProvider {
    pub fn new(error: ProviderError) -> Self {
        Self { error }
    }
}

#[async_trait::async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<Generation, ProviderError> {
        Err(self.error.clone())
    }
}
