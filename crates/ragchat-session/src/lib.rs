//! Session-scoped conversation memory.
//!
//! A [`ConversationMemory`] maps caller-chosen session ids to an ordered
//! [`SessionHistory`]. Histories are created lazily, only ever appended to,
//! and removed explicitly with `clear`.

/// Per-session message history.
pub mod session;
/// The memory trait and its in-process implementation.
pub mod store;

pub use session::SessionHistory;
pub use store::{ConversationMemory, InMemoryConversationMemory};
