use async_trait::async_trait;
use ragchat_core::{RagError, RagResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// An embedded chunk owned by a [`VectorIndex`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Caller-assigned identifier, e.g. `notes.txt#3`.
    pub id: String,
    /// Embedding vector.
    pub vector: Vec<f32>,
    /// Text the vector was computed from.
    pub text: String,
    /// Free-form string metadata (`source`, `start_offset`, ...).
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl VectorRecord {
    /// Build a record with empty metadata.
    pub fn new(id: impl Into<String>, vector: Vec<f32>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vector,
            text: text.into(),
            metadata: HashMap::new(),
        }
    }
}

/// One ranked hit from [`Retriever::query`].
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched record.
    pub record: VectorRecord,
    /// Cosine similarity with the query vector.
    pub score: f32,
}

/// The single capability the retrieval pipeline needs from an index.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` records ranked by descending similarity to `query_vector`.
    async fn query(&self, query_vector: &[f32], k: usize) -> RagResult<Vec<SearchResult>>;
}

#[derive(Debug, Default)]
struct IndexState {
    records: Vec<VectorRecord>,
    /// Locked by the first insert, released by `clear`.
    dimension: Option<usize>,
}

/// In-memory vector index using brute-force cosine similarity.
///
/// Every query scans all records, which is fine for session-sized corpora.
/// Reads share the lock; inserts and `clear` take it exclusively.
#[derive(Debug, Default)]
pub struct VectorIndex {
    state: RwLock<IndexState>,
}

impl VectorIndex {
    /// Create an empty index with no dimensionality lock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    ///
    /// Fails with [`RagError::DimensionMismatch`] when the vector length
    /// differs from the first inserted record's, and with
    /// [`RagError::InvalidInput`] for an empty vector or a NaN/infinite
    /// component; the index is left untouched.
    pub async fn insert(&self, record: VectorRecord) -> RagResult<()> {
        if record.vector.is_empty() {
            return Err(RagError::InvalidInput(format!(
                "record '{}' has an empty vector",
                record.id
            )));
        }
        if !record.vector.iter().all(|x| x.is_finite()) {
            return Err(RagError::InvalidInput(format!(
                "record '{}' has a non-finite vector component",
                record.id
            )));
        }

        let mut state = self.state.write().await;
        match state.dimension {
            Some(expected) if expected != record.vector.len() => {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: record.vector.len(),
                });
            }
            Some(_) => {}
            None => state.dimension = Some(record.vector.len()),
        }
        state.records.push(record);
        Ok(())
    }

    /// Insert several records, stopping at the first failure.
    ///
    /// Records before the failing one stay inserted.
    pub async fn insert_all(&self, records: Vec<VectorRecord>) -> RagResult<usize> {
        let mut inserted = 0;
        for record in records {
            self.insert(record).await?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Rank every record against `query_vector` and keep the top `k`.
    ///
    /// Equal scores keep insertion order. `k` beyond the record count
    /// returns everything.
    pub async fn query(&self, query_vector: &[f32], k: usize) -> RagResult<Vec<SearchResult>> {
        if k == 0 {
            return Err(RagError::InvalidInput("k must be greater than 0".to_string()));
        }
        if !query_vector.iter().all(|x| x.is_finite()) {
            return Err(RagError::InvalidInput(
                "query vector has a non-finite component".to_string(),
            ));
        }

        let state = self.state.read().await;
        if state.records.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if let Some(expected) = state.dimension {
            if expected != query_vector.len() {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: query_vector.len(),
                });
            }
        }

        let mut scored: Vec<SearchResult> = state
            .records
            .iter()
            .map(|r| SearchResult {
                score: cosine_similarity(query_vector, &r.vector),
                record: r.clone(),
            })
            .collect();

        // Stable sort: ties stay in insertion order.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);

        tracing::debug!(k = k, hits = scored.len(), "vector index query");
        Ok(scored)
    }

    /// Remove every record and release the dimensionality lock.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.records.clear();
        state.dimension = None;
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Whether the index holds no records.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }

    /// Dimensionality locked by the first insert, if any.
    pub async fn dimension(&self) -> Option<usize> {
        self.state.read().await.dimension
    }

    /// Snapshot of all records in insertion order.
    pub async fn records(&self) -> Vec<VectorRecord> {
        self.state.read().await.records.clone()
    }
}

#[async_trait]
impl Retriever for VectorIndex {
    async fn query(&self, query_vector: &[f32], k: usize) -> RagResult<Vec<SearchResult>> {
        VectorIndex::query(self, query_vector, k).await
    }
}

/// Cosine similarity `dot(a, b) / (|a| * |b|)`.
///
/// Returns 0 when either vector has zero magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}
