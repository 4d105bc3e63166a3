use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a [`Message`]. Serialized lowercase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking questions.
    User,
    /// Generated answers.
    Assistant,
    /// Instructions prepended to a generation request.
    System,
}

impl Role {
    /// Lowercase name used when rendering transcripts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry in a session history or a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique per message.
    pub id: Uuid,
    /// Who wrote it.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Creation time (UTC).
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Stamp a fresh id and the current time onto `content`.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// A question from the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// A generated answer.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// An instruction for the generation backend.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}
