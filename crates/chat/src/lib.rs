//! Conversation handling for DataLens.
//!
//! A chat turn flows through three pieces:
//!
//! 1. **`ConversationStore`** keeps a bounded window of messages per session
//! 2. **`QueryPipeline`** resolves a provider, sends the persona, history and
//!    question, then asks separately for follow-up questions
//! 3. **`parse_follow_ups`** turns the provider's list into at most three
//!    suggestions
//!
//! History is recorded only when the whole turn succeeds.

pub mod context;
pub mod followups;
pub mod pipeline;

#[cfg(test)]
mod test_helpers;

pub use context::ConversationStore;
pub use followups::parse_follow_ups;
pub use pipeline::{PipelineSettings, QueryPipeline, QueryResult};
