use chrono::{DateTime, Utc};
use ragchat_core::{Message, Role};
use serde::{Deserialize, Serialize};

/// Ordered messages for one session. Never reordered, never pruned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHistory {
    /// Caller-chosen id, never empty.
    pub session_id: String,
    /// Messages in insertion order.
    pub messages: Vec<Message>,
    /// When the session was first referenced.
    pub created_at: DateTime<Utc>,
    /// When the last message was appended.
    pub updated_at: DateTime<Utc>,
}

impl SessionHistory {
    /// Empty history for `session_id`.
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append `message` and bump `updated_at`.
    pub fn add_message(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// Number of stored messages.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of completed user/assistant exchanges.
    pub fn turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .count()
    }
}
