use super::GenerationService;
use crate::context::{DOC_CLOSE, DOC_OPEN};
use async_trait::async_trait;
use ragchat_core::{Message, RagError, RagResult, Role};

/// Offline stand-in for a language model.
///
/// When the system prompt carries retrieved `<doc>` blocks, the reply is the
/// first (highest ranked) block verbatim. Otherwise the reply is the last
/// line of the final user message, which turns a rephrase request into the
/// follow-up question itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveBackend;

impl ExtractiveBackend {
    /// Create the backend; it holds no state.
    pub fn new() -> Self {
        Self
    }
}

fn first_doc(system: &str) -> Option<&str> {
    let start = system.find(DOC_OPEN)? + DOC_OPEN.len();
    let len = system[start..].find(DOC_CLOSE)?;
    Some(system[start..start + len].trim())
}

#[async_trait]
impl GenerationService for ExtractiveBackend {
    async fn generate(&self, messages: &[Message]) -> RagResult<String> {
        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        if let Some(doc) = first_doc(system).filter(|d| !d.is_empty()) {
            return Ok(doc.to_string());
        }

        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .and_then(|m| m.content.lines().rev().find(|l| !l.trim().is_empty()))
            .map(|line| line.trim().to_string())
            .ok_or_else(|| {
                RagError::UpstreamGenerationFailure("no user message to answer".to_string())
            })
    }
}
