use crate::session::SessionHistory;
use async_trait::async_trait;
use parking_lot::Mutex;
use ragchat_core::{Message, RagError, RagResult};
use std::collections::HashMap;

/// Session-keyed message history.
///
/// An empty session id is rejected with [`RagError::InvalidSession`] by every
/// operation. One session's messages are never visible through another id.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    /// Messages for `session_id` in insertion order; creates the session on first use.
    async fn get_history(&self, session_id: &str) -> RagResult<Vec<Message>>;

    /// Append one message.
    async fn append(&self, session_id: &str, message: Message) -> RagResult<()>;

    /// Append several messages so no other writer can interleave with them.
    async fn append_all(&self, session_id: &str, messages: Vec<Message>) -> RagResult<()> {
        for message in messages {
            self.append(session_id, message).await?;
        }
        Ok(())
    }

    /// Drop the stored history for `session_id`.
    async fn clear(&self, session_id: &str) -> RagResult<()>;

    /// Known session ids, sorted.
    async fn sessions(&self) -> RagResult<Vec<String>>;
}

/// Process-wide memory guarded by a single mutex.
///
/// Create one at start-up, share it as `Arc<dyn ConversationMemory>`, and
/// clear sessions explicitly when they end.
#[derive(Debug, Default)]
pub struct InMemoryConversationMemory {
    sessions: Mutex<HashMap<String, SessionHistory>>,
}

impl InMemoryConversationMemory {
    /// Create an empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Full history record (with timestamps) for a session, if it exists.
    pub fn snapshot(&self, session_id: &str) -> Option<SessionHistory> {
        self.sessions.lock().get(session_id).cloned()
    }
}

fn check_session_id(session_id: &str) -> RagResult<()> {
    if session_id.is_empty() {
        return Err(RagError::InvalidSession(session_id.to_string()));
    }
    Ok(())
}

#[async_trait]
impl ConversationMemory for InMemoryConversationMemory {
    async fn get_history(&self, session_id: &str) -> RagResult<Vec<Message>> {
        check_session_id(session_id)?;
        let mut sessions = self.sessions.lock();
        let history = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionHistory::new(session_id));
        Ok(history.messages.clone())
    }

    async fn append(&self, session_id: &str, message: Message) -> RagResult<()> {
        self.append_all(session_id, vec![message]).await
    }

    async fn append_all(&self, session_id: &str, messages: Vec<Message>) -> RagResult<()> {
        check_session_id(session_id)?;
        let mut sessions = self.sessions.lock();
        let history = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionHistory::new(session_id));
        for message in messages {
            history.add_message(message);
        }
        tracing::debug!(
            session_id = session_id,
            messages = history.message_count(),
            "session history appended"
        );
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> RagResult<()> {
        check_session_id(session_id)?;
        self.sessions.lock().remove(session_id);
        Ok(())
    }

    async fn sessions(&self) -> RagResult<Vec<String>> {
        let mut ids: Vec<String> = self.sessions.lock().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
