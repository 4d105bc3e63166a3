use crate::embedding::EmbeddingProvider;
use crate::loader::Document;
use crate::splitter::TextSplitter;
use crate::store::{SearchResult, VectorIndex, VectorRecord};
use ragchat_core::{RagError, RagResult};
use std::sync::Arc;
use tracing::info;

/// Build-time and text-level search front end over a [`VectorIndex`].
///
/// Splits documents, embeds the chunks in one batch, and inserts them.
/// Queries go through the same embedder so vectors stay comparable.
pub struct VectorStoreRetriever {
    splitter: TextSplitter,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
}

impl VectorStoreRetriever {
    /// Wire a splitter, an embedder, and a shared index together.
    pub fn new(
        splitter: TextSplitter,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<VectorIndex>,
    ) -> Self {
        Self {
            splitter,
            embedder,
            index,
        }
    }

    /// The underlying index.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// The embedder used for both ingestion and queries.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Split, embed, and index `documents`. Returns the number of chunks inserted.
    ///
    /// Record ids are `<source>#<chunk index>`; metadata gains `source`,
    /// `start_offset` and `chunk_index`.
    pub async fn add_documents(&self, documents: &[Document]) -> RagResult<usize> {
        let chunks = self.splitter.split_documents(documents);
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(RagError::into_embedding_failure)?;
        if vectors.len() != chunks.len() {
            return Err(RagError::UpstreamEmbeddingFailure(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                let mut metadata = chunk.metadata;
                metadata.insert("source".to_string(), chunk.source_id.clone());
                metadata.insert("start_offset".to_string(), chunk.start_offset.to_string());
                metadata.insert("chunk_index".to_string(), chunk.index.to_string());
                VectorRecord {
                    id: format!("{}#{}", chunk.source_id, chunk.index),
                    vector,
                    text: chunk.text,
                    metadata,
                }
            })
            .collect();

        let inserted = self.index.insert_all(records).await?;
        info!(
            documents = documents.len(),
            chunks = inserted,
            "documents indexed"
        );
        Ok(inserted)
    }

    /// Embed `query` and return the `k` closest chunks.
    pub async fn similarity_search(&self, query: &str, k: usize) -> RagResult<Vec<SearchResult>> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(RagError::into_embedding_failure)?;
        self.index.query(&vector, k).await
    }
}
