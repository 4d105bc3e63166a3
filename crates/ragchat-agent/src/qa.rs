use crate::backends::GenerationService;
use crate::config::PipelineConfig;
use crate::context::format_context;
use crate::prompt;
use ragchat_core::{CancellationToken, RagError, RagResult};
use ragchat_memory::{EmbeddingProvider, Retriever};
use std::sync::Arc;
use tracing::info;

/// Single-turn retrieval QA: retrieve, then answer. No rephrase step and no memory.
pub struct RetrievalQa {
    embedder: Arc<dyn EmbeddingProvider>,
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn GenerationService>,
    top_k: usize,
}

impl RetrievalQa {
    /// Fails with `InvalidConfiguration` when `top_k` is 0.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn GenerationService>,
        config: PipelineConfig,
    ) -> RagResult<Self> {
        config.validate()?;
        Ok(Self {
            embedder,
            retriever,
            generator,
            top_k: config.top_k,
        })
    }

    /// Answer `question` from the index alone.
    pub async fn ask(&self, question: &str) -> RagResult<String> {
        self.ask_with_cancel(question, &CancellationToken::new()).await
    }

    /// Like [`ask`](Self::ask), aborting with `RagError::Cancelled` if `cancel` fires.
    pub async fn ask_with_cancel(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> RagResult<String> {
        if question.trim().is_empty() {
            return Err(RagError::InvalidInput("question is empty".to_string()));
        }
        let vector = cancel
            .run("embed", self.embedder.embed(question))
            .await
            .map_err(RagError::into_embedding_failure)?;
        let documents = self.retriever.query(&vector, self.top_k).await?;
        let messages = prompt::qa_messages(&format_context(&documents), question);
        let answer = cancel
            .run("answer", self.generator.generate(&messages))
            .await
            .map_err(RagError::into_generation_failure)?;
        info!(chunks = documents.len(), "single-turn question answered");
        Ok(answer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::backends::extractive::ExtractiveBackend;
    use ragchat_memory::{LocalEmbedding, VectorIndex};

    #[tokio::test]
    async fn test_empty_index_surfaces() {
        let qa = RetrievalQa::new(
            Arc::new(LocalEmbedding::new(32)),
            Arc::new(VectorIndex::new()),
            Arc::new(ExtractiveBackend::new()),
            PipelineConfig::default(),
        )
        .unwrap();
        assert!(matches!(qa.ask("anything").await, Err(RagError::EmptyIndex)));
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let qa = RetrievalQa::new(
            Arc::new(LocalEmbedding::new(32)),
            Arc::new(VectorIndex::new()),
            Arc::new(ExtractiveBackend::new()),
            PipelineConfig::default(),
        )
        .unwrap();
        assert!(matches!(qa.ask(" ").await, Err(RagError::InvalidInput(_))));
    }
}
