//! `ragchat.toml` loading.
//!
//! Every section is optional; a missing file yields the defaults.

use ragchat_agent::{GenerationConfig, PipelineConfig};
use ragchat_core::{RagError, RagResult};
use ragchat_memory::TextSplitter;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RagchatConfig {
    #[serde(default)]
    pub splitter: SplitterConfig,
    #[serde(default)]
    pub retrieval: PipelineConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub loader: LoaderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitterConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_recursive")]
    pub recursive: bool,
    /// Glob-lite patterns (`*.md`, `yarn.lock`) skipped when walking directories.
    #[serde(default)]
    pub ignore_paths: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            recursive: default_recursive(),
            ignore_paths: vec![],
        }
    }
}

fn default_chunk_size() -> usize {
    1536
}
fn default_chunk_overlap() -> usize {
    128
}
fn default_dimension() -> usize {
    256
}
fn default_recursive() -> bool {
    true
}

impl RagchatConfig {
    /// Read `path` if it exists, otherwise fall back to defaults.
    pub async fn load(path: &Path) -> RagResult<Self> {
        let config = match tokio::fs::read_to_string(path).await {
            Ok(raw) => Self::parse(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn parse(raw: &str) -> RagResult<Self> {
        toml::from_str(raw).map_err(|e| RagError::InvalidConfiguration(e.to_string()))
    }

    pub fn validate(&self) -> RagResult<()> {
        self.splitter()?;
        self.retrieval.validate()?;
        self.generation.validate()?;
        if self.embedding.dimension == 0 {
            return Err(RagError::InvalidConfiguration(
                "embedding.dimension must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn splitter(&self) -> RagResult<TextSplitter> {
        TextSplitter::new(self.splitter.chunk_size, self.splitter.chunk_overlap)
    }
}
