use crate::backends::command::CommandBackend;
use crate::backends::extractive::ExtractiveBackend;
use crate::backends::GenerationService;
use crate::config::{GenerationConfig, GenerationProvider};
use async_trait::async_trait;
use ragchat_core::{Message, RagError, RagResult};

/// Generation client that dispatches to the configured backend.
///
/// To add a new backend: implement `GenerationService` in `backends/` and wire it here.
pub struct LlmClient {
    backend: Box<dyn GenerationService>,
}

impl LlmClient {
    /// Validate `config` and build the matching backend.
    pub fn new(config: &GenerationConfig) -> RagResult<Self> {
        config.validate()?;
        let backend: Box<dyn GenerationService> = match config.provider {
            GenerationProvider::Extractive => Box::new(ExtractiveBackend::new()),
            GenerationProvider::Command => {
                let program = config.command.clone().ok_or_else(|| {
                    RagError::InvalidConfiguration("generation.command is missing".to_string())
                })?;
                Box::new(CommandBackend::new(program, config.args.clone()))
            }
        };
        tracing::debug!(provider = ?config.provider, "generation client ready");
        Ok(Self { backend })
    }

    /// Create from a pre-built backend (for custom providers and tests).
    pub fn from_backend(backend: Box<dyn GenerationService>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl GenerationService for LlmClient {
    async fn generate(&self, messages: &[Message]) -> RagResult<String> {
        self.backend.generate(messages).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_config_is_extractive() {
        let client = LlmClient::new(&GenerationConfig::default()).unwrap();
        let reply = client
            .generate(&[Message::user("Rephrase:\nwhat is it?")])
            .await
            .unwrap();
        assert_eq!(reply, "what is it?");
    }

    #[tokio::test]
    async fn test_from_backend_delegates() {
        let client = LlmClient::from_backend(Box::new(ExtractiveBackend::new()));
        let reply = client
            .generate(&[
                Message::system("<context>\n<doc>\nquoted chunk\n</doc>\n</context>"),
                Message::user("what does it say?"),
            ])
            .await
            .unwrap();
        assert_eq!(reply, "quoted chunk");
    }

    #[test]
    fn test_command_without_program_rejected() {
        let config = GenerationConfig {
            provider: GenerationProvider::Command,
            command: None,
            args: vec![],
        };
        assert!(matches!(
            LlmClient::new(&config),
            Err(RagError::InvalidConfiguration(_))
        ));
    }
}
