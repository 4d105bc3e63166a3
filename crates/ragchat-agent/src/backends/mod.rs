/// Local executable backend.
pub mod command;
/// Offline extractive backend.
pub mod extractive;

use async_trait::async_trait;
use ragchat_core::{Message, RagResult};

/// Trait for text generation backends.
///
/// A backend receives the full ordered conversation (system instructions,
/// history, and the current request) and returns the assistant's reply.
/// Failures are reported as `RagError::UpstreamGenerationFailure`; the
/// pipeline never retries them.
///
/// To add a new backend:
/// 1. Create a new module in `backends/`
/// 2. Implement `GenerationService` for your struct
/// 3. Add the variant to `GenerationProvider` in `config.rs`
/// 4. Wire it up in `LlmClient::new()` in `llm.rs`
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Produce a reply to `messages`.
    async fn generate(&self, messages: &[Message]) -> RagResult<String>;
}

/// Render messages as a plain `role: content` transcript, one block per message.
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}
