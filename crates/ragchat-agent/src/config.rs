use ragchat_core::{RagError, RagResult};
use serde::{Deserialize, Serialize};

/// Which backend answers generation requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    /// Answer by quoting the best retrieved chunk. Runs offline, no model needed.
    #[default]
    Extractive,
    /// Pipe the rendered conversation to a local executable and read its stdout.
    Command,
}

/// `[generation]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Backend kind; extractive unless set.
    #[serde(default)]
    pub provider: GenerationProvider,
    /// Program to run for [`GenerationProvider::Command`].
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments passed to `command`.
    #[serde(default)]
    pub args: Vec<String>,
}

impl GenerationConfig {
    /// Reject settings that cannot produce a working client.
    pub fn validate(&self) -> RagResult<()> {
        if self.provider == GenerationProvider::Command
            && self.command.as_deref().map_or(true, |c| c.trim().is_empty())
        {
            return Err(RagError::InvalidConfiguration(
                "generation.command is required when provider = \"command\"".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[retrieval]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Chunks retrieved per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    4
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl PipelineConfig {
    /// Reject settings that cannot produce a working client.
    pub fn validate(&self) -> RagResult<()> {
        if self.top_k == 0 {
            return Err(RagError::InvalidConfiguration(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_defaults() {
        let config: PipelineConfig = toml::from_str("").unwrap();
        assert_eq!(config.top_k, 4);
        config.validate().unwrap();
    }

    #[test]
    fn test_zero_top_k_invalid() {
        let config = PipelineConfig { top_k: 0 };
        assert!(matches!(
            config.validate(),
            Err(RagError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_generation_provider_serialization() {
        let json = serde_json::to_string(&GenerationProvider::Command).unwrap();
        assert_eq!(json, "\"command\"");
        let parsed: GenerationConfig =
            toml::from_str("provider = \"command\"\ncommand = \"llama-cli\"\nargs = [\"-m\", \"model.gguf\"]")
                .unwrap();
        assert_eq!(parsed.provider, GenerationProvider::Command);
        assert_eq!(parsed.args.len(), 2);
        parsed.validate().unwrap();
    }

    #[test]
    fn test_command_provider_requires_command() {
        let config = GenerationConfig {
            provider: GenerationProvider::Command,
            command: Some("  ".to_string()),
            args: vec![],
        };
        assert!(matches!(
            config.validate(),
            Err(RagError::InvalidConfiguration(_))
        ));
        GenerationConfig::default().validate().unwrap();
    }
}
