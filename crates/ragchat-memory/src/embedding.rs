use async_trait::async_trait;
use ragchat_core::{RagError, RagResult};
use std::collections::HashMap;

/// Trait for computing text embeddings (vector representations).
///
/// Implementations report failures as [`RagError::UpstreamEmbeddingFailure`].
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Compute the embedding vector for a single text.
    async fn embed(&self, text: &str) -> RagResult<Vec<f32>>;

    /// Compute embeddings for a batch of texts, preserving order.
    async fn embed_batch(&self, texts: &[&str]) -> RagResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Dimension of the vectors produced by this provider.
    fn dimension(&self) -> usize;
}

/// Deterministic feature-hashing embedding that runs without any model.
///
/// Each lowercase word token is hashed into a signed bucket, weighted by its
/// term frequency, and the result is L2-normalised. Texts sharing vocabulary
/// land close together, which is enough for demos and tests.
#[derive(Debug, Clone)]
pub struct LocalEmbedding {
    dimension: usize,
}

impl LocalEmbedding {
    /// Create an embedder producing `dimension`-length vectors.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for LocalEmbedding {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        if text.is_empty() {
            return Err(RagError::UpstreamEmbeddingFailure(
                "cannot embed empty text".to_string(),
            ));
        }

        let lowered = text.to_lowercase();
        let mut freq: HashMap<&str, f32> = HashMap::new();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 1)
        {
            *freq.entry(token).or_insert(0.0) += 1.0;
        }

        let mut vector = vec![0.0f32; self.dimension];
        let total: f32 = freq.values().sum();
        if total == 0.0 {
            return Ok(vector);
        }

        for (token, count) in &freq {
            let tf = count / total;
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash as usize) % self.dimension;
            // The top bit picks a sign so unrelated collisions tend to cancel.
            let sign = if hash >> 31 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign * tf;
            let echo = (fnv1a(&[token.as_bytes(), b"#"].concat()) as usize) % self.dimension;
            vector[echo] += sign * tf * 0.5;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// FNV-1a, 32-bit.
fn fnv1a(data: &[u8]) -> u32 {
    let mut hash: u32 = 2_166_136_261;
    for &byte in data {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(16_777_619);
    }
    hash
}
