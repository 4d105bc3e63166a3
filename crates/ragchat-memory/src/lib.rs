//! Document ingestion and in-memory semantic retrieval.
//!
//! Provides overlapping fixed-window text splitting, the embedding provider
//! seam with a local hashed bag-of-words implementation, plain-text document
//! sources, and a brute-force cosine-similarity vector index.
//!
//! # Main types
//!
//! - [`TextSplitter`]: Splits text into overlapping [`DocumentChunk`]s.
//! - [`EmbeddingProvider`]: Trait for the external embedding service.
//! - [`LocalEmbedding`]: Deterministic local embedding (no network).
//! - [`VectorIndex`]: In-memory store of [`VectorRecord`]s with cosine ranking.
//! - [`Retriever`]: The single `query` capability the pipeline depends on.
//! - [`VectorStoreRetriever`]: Ties a splitter, an embedder, and an index together.
//! - [`DocumentSource`]: Trait for loading [`Document`]s from somewhere.

/// Embedding provider trait and local implementation.
pub mod embedding;
/// Plain-text document sources.
pub mod loader;
/// Ingestion and text-level similarity search.
pub mod retriever;
/// Fixed-window text splitting with overlap.
pub mod splitter;
/// Vector index and the retriever trait.
pub mod store;

pub use embedding::{EmbeddingProvider, LocalEmbedding};
pub use loader::{DirectoryLoader, Document, DocumentSource, TextFileLoader};
pub use retriever::VectorStoreRetriever;
pub use splitter::{DocumentChunk, TextSplitter};
pub use store::{cosine_similarity, Retriever, SearchResult, VectorIndex, VectorRecord};
