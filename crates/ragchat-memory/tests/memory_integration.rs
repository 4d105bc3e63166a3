#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Integration tests for the ragchat-memory crate.
//!
//! Covers the chunking scenarios, vector index ranking and failure modes,
//! concurrent access, and end-to-end ingestion from files on disk.

use std::sync::Arc;

use tempfile::TempDir;

use ragchat_core::RagError;
use ragchat_memory::{
    cosine_similarity, DirectoryLoader, DocumentSource, EmbeddingProvider, LocalEmbedding,
    Retriever, TextSplitter, VectorIndex, VectorRecord, VectorStoreRetriever,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn record(id: &str, vector: Vec<f32>) -> VectorRecord {
    VectorRecord::new(id, vector, id.to_uppercase())
}

// ---------------------------------------------------------------------------
// 1. Chunking scenario
// ---------------------------------------------------------------------------

#[test]
fn chunking_scenario_four_by_two() {
    let splitter = TextSplitter::new(4, 2).unwrap();
    let chunks = splitter.split("letters", "abcdefghij");
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["abcd", "cdef", "efgh", "ghij"]);
    assert!(chunks.iter().all(|c| c.source_id == "letters"));
    assert!(chunks
        .windows(2)
        .all(|w| w[0].start_offset <= w[1].start_offset));
}

// ---------------------------------------------------------------------------
// 2. Ranking scenario through the Retriever trait
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ranking_scenario_through_retriever_trait() {
    let index = Arc::new(VectorIndex::new());
    index.insert(record("first", vec![1.0, 0.0])).await.unwrap();
    index.insert(record("second", vec![0.0, 1.0])).await.unwrap();
    index.insert(record("third", vec![0.9, 0.1])).await.unwrap();

    let retriever: Arc<dyn Retriever> = index.clone();
    let results = retriever.query(&[1.0, 0.0], 2).await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].record.id, "first");
    assert!((results[0].score - 1.0).abs() < 1e-6);
    assert_eq!(results[1].record.id, "third");
    assert!((results[1].score - 0.994).abs() < 1e-3);
}

// ---------------------------------------------------------------------------
// 3. Results always sorted, ties by insertion order
// ---------------------------------------------------------------------------

#[tokio::test]
async fn results_sorted_descending_with_stable_ties() {
    let index = VectorIndex::new();
    let vectors = [
        [0.2, 0.8],
        [1.0, 0.0],
        [0.2, 0.8],
        [0.5, 0.5],
        [0.0, 1.0],
        [1.0, 0.0],
    ];
    for (i, v) in vectors.iter().enumerate() {
        index.insert(record(&format!("r{i}"), v.to_vec())).await.unwrap();
    }

    let results = index.query(&[1.0, 0.0], 100).await.unwrap();
    assert_eq!(results.len(), vectors.len(), "k > count returns everything");
    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    let ids: Vec<&str> = results.iter().map(|r| r.record.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r5", "r3", "r0", "r2", "r4"]);
}

// ---------------------------------------------------------------------------
// 4. Mismatched dimensionality never changes the index
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mismatched_dimension_always_rejected() {
    let index = VectorIndex::new();
    index.insert(record("base", vec![0.1, 0.2, 0.3])).await.unwrap();

    for bad in [vec![1.0], vec![1.0, 2.0], vec![1.0, 2.0, 3.0, 4.0]] {
        let len = bad.len();
        let err = index.insert(record("bad", bad)).await.unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch { expected: 3, actual } if actual == len
        ));
    }

    let records = index.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "base");
}

// ---------------------------------------------------------------------------
// 5. Concurrent readers and writers
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_and_queries() {
    let index = Arc::new(VectorIndex::new());
    index.insert(record("seed", vec![1.0, 0.0])).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..16 {
        let index = Arc::clone(&index);
        handles.push(tokio::spawn(async move {
            index
                .insert(record(&format!("w{i}"), vec![i as f32, 1.0]))
                .await
                .unwrap();
            index.query(&[1.0, 0.0], 3).await.unwrap().len()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap() >= 1);
    }
    assert_eq!(index.len().await, 17);
}

// ---------------------------------------------------------------------------
// 6. Ingest a directory and search it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ingest_directory_and_search() {
    let tmp = TempDir::new().unwrap();
    tokio::fs::write(
        tmp.path().join("crawler.txt"),
        "ML-Blink is a crawler that discovers machine learning datasets on the web.",
    )
    .await
    .unwrap();
    tokio::fs::write(
        tmp.path().join("garden.txt"),
        "Tomatoes need full sun and regular watering during summer.",
    )
    .await
    .unwrap();
    tokio::fs::write(tmp.path().join("NOTES.md"), "ignored").await.unwrap();

    let docs = DirectoryLoader::new(tmp.path())
        .ignore_paths(["*.md"])
        .unwrap()
        .load()
        .await
        .unwrap();
    assert_eq!(docs.len(), 2);

    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(LocalEmbedding::new(128));
    let retriever = VectorStoreRetriever::new(
        TextSplitter::new(40, 10).unwrap(),
        Arc::clone(&embedder),
        Arc::new(VectorIndex::new()),
    );
    let inserted = retriever.add_documents(&docs).await.unwrap();
    assert!(inserted >= 4, "both documents span several windows");
    assert_eq!(retriever.index().dimension().await, Some(128));

    let hits = retriever
        .similarity_search("what does the ML-Blink crawler discover", 2)
        .await
        .unwrap();
    let source = hits[0].record.metadata.get("source").unwrap();
    assert!(source.ends_with("crawler.txt"), "got {source}");
}

// ---------------------------------------------------------------------------
// 7. Cosine helper agrees with embedding intuition
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cosine_similarity_orders_related_texts() {
    let embedder = LocalEmbedding::default();
    let base = embedder
        .embed("What are vectors useful for in machine learning?")
        .await
        .unwrap();
    let similar = embedder
        .embed("Vectors are useful representations for machine learning.")
        .await
        .unwrap();
    let unrelated = embedder
        .embed("A group of parrots is called a pandemonium.")
        .await
        .unwrap();

    assert!(cosine_similarity(&base, &similar) > cosine_similarity(&base, &unrelated));
}
