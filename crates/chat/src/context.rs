//! Conversation history: per-session message windows.
//!
//! Each session holds at most `window` messages; appending past the window
//! evicts whole messages from the front. Sessions are created lazily on the
//! first append and live until cleared or the process exits.
//!
//! The session map sits behind a `RwLock` and every session has its own
//! `Mutex`, so different sessions never contend and a user/assistant pair
//! lands as one unit.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use datalens_core::message::{Message, SessionId};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

pub const DEFAULT_WINDOW: usize = 10;

type History = Arc<Mutex<VecDeque<Message>>>;

pub struct ConversationStore {
    sessions: RwLock<HashMap<SessionId, History>>,
    window: usize,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl ConversationStore {
    /// A store keeping the most recent `window` messages per session.
    /// A window of zero is treated as one.
    pub fn new(window: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Push `messages` onto the session's history, creating it if needed.
    ///
    /// The map guard is held until the push completes, so a concurrent
    /// `clear` either runs before (and the messages start a fresh history)
    /// or after (and removes them). Returns the resulting length.
    async fn record(
        &self,
        session: &SessionId,
        messages: impl IntoIterator<Item = Message>,
    ) -> usize {
        {
            let sessions = self.sessions.read().await;
            if let Some(history) = sessions.get(session) {
                let mut history = history.lock().await;
                return self.push_trimmed(&mut history, messages);
            }
        }
        let mut sessions = self.sessions.write().await;
        let history = sessions.entry(session.clone()).or_default();
        let mut history = history.lock().await;
        self.push_trimmed(&mut history, messages)
    }

    fn push_trimmed(
        &self,
        history: &mut VecDeque<Message>,
        messages: impl IntoIterator<Item = Message>,
    ) -> usize {
        for message in messages {
            history.push_back(message);
            while history.len() > self.window {
                history.pop_front();
            }
        }
        history.len()
    }

    /// Append one message, evicting the oldest past the window.
    pub async fn append(&self, session: &SessionId, message: Message) {
        self.record(session, [message]).await;
    }

    /// Append a user message and its reply under a single lock.
    pub async fn append_turn(&self, session: &SessionId, user: Message, assistant: Message) {
        let len = self.record(session, [user, assistant]).await;
        debug!(session = %session, len, "Turn recorded");
    }

    /// Current history, oldest first. Empty for an unknown session.
    pub async fn snapshot(&self, session: &SessionId) -> Vec<Message> {
        let history = match self.sessions.read().await.get(session) {
            Some(h) => Arc::clone(h),
            None => return Vec::new(),
        };
        let history = history.lock().await;
        history.iter().cloned().collect()
    }

    /// Drop a session's history. Clearing an unknown session is a no-op.
    pub async fn clear(&self, session: &SessionId) {
        if self.sessions.write().await.remove(session).is_some() {
            debug!(session = %session, "Session cleared");
        }
    }

    pub async fn len(&self, session: &SessionId) -> usize {
        self.snapshot(session).await.len()
    }

    /// Ids of sessions with live history, sorted.
    pub async fn sessions(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }
}
