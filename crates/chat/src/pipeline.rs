//! The query pipeline: one chat turn from question to structured answer.
//!
//! A turn resolves the named provider, asks it for an answer with the
//! session history as context, asks it again (without history) for
//! follow-up questions, and records the exchange. History is only touched
//! once both calls have succeeded.

use std::sync::Arc;

use datalens_config::AppConfig;
use datalens_core::error::{Error, Result};
use datalens_core::message::{Message, SessionId};
use datalens_core::provider::GenerationRequest;
use datalens_providers::{ProviderRegistry, ResolvedProvider};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::ConversationStore;
use crate::followups::parse_follow_ups;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are DataLens AI, an expert data analyst assistant. Your role is to:
1. Help users understand and analyze data
2. Provide clear, concise explanations
3. Suggest relevant follow-up questions
4. Maintain a professional and helpful tone
5. Focus on data-driven insights and analysis

When responding:
- Be specific and data-focused
- Use clear, technical language when appropriate
- Suggest relevant visualizations when applicable
- Provide context for your suggestions
- Keep responses concise but informative";

pub const FOLLOW_UP_SYSTEM_PROMPT: &str = "Generate 3 relevant follow-up questions based on the previous response. Keep them concise and data-focused.";

/// Substituted when a provider answers with no text.
pub const EMPTY_RESPONSE_FALLBACK: &str = "I apologize, but I could not generate a response.";

/// The outcome of one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub response_text: String,
    pub suggested_questions: Vec<String>,
    pub provider_used: String,
}

/// Prompt and sampling parameters for each turn.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub system_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub follow_up_max_tokens: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.7,
            max_tokens: 500,
            follow_up_max_tokens: 150,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            system_prompt: config
                .assistant
                .system_prompt_override
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            temperature: config.generation.temperature,
            max_tokens: config.generation.max_tokens,
            follow_up_max_tokens: config.generation.follow_up_max_tokens,
        }
    }
}

pub struct QueryPipeline {
    registry: Arc<ProviderRegistry>,
    store: Arc<ConversationStore>,
    settings: PipelineSettings,
}

impl QueryPipeline {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        store: Arc<ConversationStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            registry,
            store,
            settings,
        }
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Run one turn for `session` against the provider registered as
    /// `provider_name`.
    pub async fn process(
        &self,
        session: &SessionId,
        query: &str,
        provider_name: &str,
    ) -> Result<QueryResult> {
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".into()));
        }

        let resolved = self.registry.resolve(provider_name)?;
        let history = self.store.snapshot(session).await;

        debug!(
            session = %session,
            provider = %resolved.name,
            model = %resolved.model,
            history = history.len(),
            "Processing query"
        );

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(&self.settings.system_prompt));
        messages.extend(history);
        messages.push(Message::user(query));

        let request = GenerationRequest::new(&resolved.model, messages)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        let generation = resolved.provider.generate(request).await.map_err(|e| {
            warn!(session = %session, provider = %resolved.name, error = %e, "Generation failed");
            Error::ProviderFailure(e)
        })?;

        let response_text = if generation.text.trim().is_empty() {
            EMPTY_RESPONSE_FALLBACK.to_string()
        } else {
            generation.text
        };

        let suggested_questions = self.follow_ups(&resolved, &response_text).await?;

        self.store
            .append_turn(
                session,
                Message::user(query),
                Message::assistant(&response_text),
            )
            .await;

        info!(
            session = %session,
            provider = %resolved.name,
            model = %generation.model,
            suggestions = suggested_questions.len(),
            "Query answered"
        );

        Ok(QueryResult {
            response_text,
            suggested_questions,
            provider_used: provider_name.to_string(),
        })
    }

    /// Ask for follow-up questions about `response_text`, outside the dialogue.
    async fn follow_ups(
        &self,
        resolved: &ResolvedProvider,
        response_text: &str,
    ) -> Result<Vec<String>> {
        let messages = vec![
            Message::system(FOLLOW_UP_SYSTEM_PROMPT),
            Message::user(format!(
                "Based on this response: \"{response_text}\", suggest 3 follow-up questions."
            )),
        ];
        let request = GenerationRequest::new(&resolved.model, messages)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.follow_up_max_tokens);

        let generation = resolved.provider.generate(request).await.map_err(|e| {
            warn!(provider = %resolved.name, error = %e, "Follow-up generation failed");
            Error::ProviderFailure(e)
        })?;

        Ok(parse_follow_ups(&generation.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{FailingProvider, ScriptedProvider};
    use datalens_core::error::ProviderError;
    use datalens_core::message::Role;

    fn pipeline_with(provider: Arc<ScriptedProvider>, window: usize) -> QueryPipeline {
        let mut registry = ProviderRegistry::new("mock");
        registry.register("mock", provider, "mock-model");
        QueryPipeline::new(
            Arc::new(registry),
            Arc::new(ConversationStore::new(window)),
            PipelineSettings::default(),
        )
    }

    fn sid() -> SessionId {
        SessionId::from("s1")
    }

    #[tokio::test]
    async fn turn_returns_answer_and_follow_ups() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "Revenue grew 8% year over year.",
            "1. Which region grew fastest?\n2. What about margins?\n3. Any seasonality?",
        ]));
        let pipeline = pipeline_with(provider.clone(), 10);

        let result = pipeline.process(&sid(), "How did revenue change?", "mock").await.unwrap();

        assert_eq!(result.response_text, "Revenue grew 8% year over year.");
        assert_eq!(
            result.suggested_questions,
            vec!["Which region grew fastest?", "What about margins?", "Any seasonality?"]
        );
        assert_eq!(result.provider_used, "mock");
        assert_eq!(provider.call_count(), 2);

        let history = pipeline.store().snapshot(&sid()).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "How did revenue change?");
        assert_eq!(history[1].content, "Revenue grew 8% year over year.");
    }

    #[tokio::test]
    async fn answer_request_carries_persona_history_and_caps() {
        let provider = Arc::new(ScriptedProvider::new(vec!["a1", "", "a2", ""]));
        let pipeline = pipeline_with(provider.clone(), 10);

        pipeline.process(&sid(), "first", "mock").await.unwrap();
        pipeline.process(&sid(), "second", "mock").await.unwrap();

        let requests = provider.requests();
        let answer = &requests[2];
        assert_eq!(answer.model, "mock-model");
        assert_eq!(answer.max_tokens, Some(500));
        assert!((answer.temperature - 0.7).abs() < f32::EPSILON);

        let contents: Vec<_> = answer.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec![DEFAULT_SYSTEM_PROMPT, "first", "a1", "second"]);
        assert_eq!(answer.messages[0].role, Role::System);
    }

    #[tokio::test]
    async fn follow_up_request_is_isolated() {
        let provider = Arc::new(ScriptedProvider::new(vec!["a1", "", "a2", ""]));
        let pipeline = pipeline_with(provider.clone(), 10);

        pipeline.process(&sid(), "first", "mock").await.unwrap();
        pipeline.process(&sid(), "second", "mock").await.unwrap();

        let follow_up = &provider.requests()[3];
        assert_eq!(follow_up.max_tokens, Some(150));
        assert_eq!(follow_up.messages.len(), 2);
        assert_eq!(follow_up.messages[0].content, FOLLOW_UP_SYSTEM_PROMPT);
        assert_eq!(
            follow_up.messages[1].content,
            "Based on this response: \"a2\", suggest 3 follow-up questions."
        );
    }

    #[tokio::test]
    async fn query_text_passed_through_untrimmed() {
        let provider = Arc::new(ScriptedProvider::new(vec!["ok", ""]));
        let pipeline = pipeline_with(provider.clone(), 10);

        pipeline.process(&sid(), "  Top 5 products?\n", "mock").await.unwrap();

        let answer = &provider.requests()[0];
        assert_eq!(answer.messages.last().unwrap().content, "  Top 5 products?\n");
        assert_eq!(
            pipeline.store().snapshot(&sid()).await[0].content,
            "  Top 5 products?\n"
        );
    }

    #[tokio::test]
    async fn empty_answer_becomes_apology() {
        let provider = Arc::new(ScriptedProvider::new(vec!["   ", "1. Retry?"]));
        let pipeline = pipeline_with(provider.clone(), 10);

        let result = pipeline.process(&sid(), "hello", "mock").await.unwrap();
        assert_eq!(result.response_text, EMPTY_RESPONSE_FALLBACK);
        assert_eq!(result.suggested_questions, vec!["Retry?"]);

        let follow_up = &provider.requests()[1];
        assert!(follow_up.messages[1].content.contains(EMPTY_RESPONSE_FALLBACK));
        assert_eq!(
            pipeline.store().snapshot(&sid()).await[1].content,
            EMPTY_RESPONSE_FALLBACK
        );
    }

    #[tokio::test]
    async fn empty_query_rejected_without_side_effects() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let pipeline = pipeline_with(provider.clone(), 10);

        let err = pipeline.process(&sid(), "  \n ", "mock").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(provider.call_count(), 0);
        assert!(pipeline.store().snapshot(&sid()).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_provider_rejected() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let pipeline = pipeline_with(provider.clone(), 10);

        let err = pipeline.process(&sid(), "hi", "gemini").await.unwrap_err();
        assert!(matches!(err, Error::UnknownProvider(ref n) if n == "gemini"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn provider_failure_leaves_history_unchanged() {
        let mut registry = ProviderRegistry::new("down");
        registry.register(
            "down",
            Arc::new(FailingProvider::new(ProviderError::Network("connection refused".into()))),
            "m",
        );
        let store = Arc::new(ConversationStore::default());
        store.append(&sid(), Message::user("earlier")).await;
        let pipeline = QueryPipeline::new(Arc::new(registry), store.clone(), PipelineSettings::default());

        let err = pipeline.process(&sid(), "hi", "down").await.unwrap_err();
        assert!(matches!(err, Error::ProviderFailure(ProviderError::Network(_))));

        let history = store.snapshot(&sid()).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "earlier");
    }

    #[tokio::test]
    async fn follow_up_failure_aborts_turn() {
        let provider = Arc::new(
            ScriptedProvider::new(vec!["answer"])
                .then_fail(ProviderError::RateLimited { retry_after_secs: 5 }),
        );
        let pipeline = pipeline_with(provider.clone(), 10);

        let err = pipeline.process(&sid(), "hi", "mock").await.unwrap_err();
        assert!(matches!(err, Error::ProviderFailure(ProviderError::RateLimited { .. })));
        assert!(pipeline.store().snapshot(&sid()).await.is_empty());
    }

    #[tokio::test]
    async fn history_is_bounded_by_window() {
        let replies: Vec<&str> = std::iter::repeat_n(["ok", ""], 4).flatten().collect();
        let provider = Arc::new(ScriptedProvider::new(replies));
        let pipeline = pipeline_with(provider.clone(), 4);

        for i in 0..4 {
            pipeline.process(&sid(), &format!("q{i}"), "mock").await.unwrap();
        }

        let contents: Vec<_> = pipeline
            .store()
            .snapshot(&sid())
            .await
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["q2", "ok", "q3", "ok"]);
    }

    #[tokio::test]
    async fn concurrent_sessions_do_not_mix() {
        let replies: Vec<&str> = std::iter::repeat_n(["same", ""], 8).flatten().collect();
        let provider = Arc::new(ScriptedProvider::new(replies));
        let pipeline = Arc::new(pipeline_with(provider.clone(), 10));

        let turns = (0..8).map(|i| {
            let pipeline = Arc::clone(&pipeline);
            async move {
                let session = SessionId::from(format!("s{}", i % 4));
                pipeline.process(&session, &format!("q{i}"), "mock").await
            }
        });
        let results = futures::future::join_all(turns).await;
        assert!(results.iter().all(|r| r.is_ok()));

        let store = pipeline.store();
        assert_eq!(store.sessions().await.len(), 4);
        for s in store.sessions().await {
            let history = store.snapshot(&s).await;
            assert_eq!(history.len(), 4);
            assert_eq!(history[0].role, Role::User);
            assert_eq!(history[1].role, Role::Assistant);
            assert_eq!(history[2].role, Role::User);
        }
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = QueryResult {
            response_text: "r".into(),
            suggested_questions: vec!["q".into()],
            provider_used: "ollama".into(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["responseText"], "r");
        assert_eq!(json["suggestedQuestions"][0], "q");
        assert_eq!(json["providerUsed"], "ollama");
    }

    #[test]
    fn settings_follow_config() {
        let mut config = AppConfig::default();
        config.generation.max_tokens = 800;
        config.assistant.system_prompt_override = Some("Be brief.".into());

        let settings = PipelineSettings::from_config(&config);
        assert_eq!(settings.max_tokens, 800);
        assert_eq!(settings.follow_up_max_tokens, 150);
        assert_eq!(settings.system_prompt, "Be brief.");
    }
}
