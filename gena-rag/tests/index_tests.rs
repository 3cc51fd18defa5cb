//! Behavior and property tests for the persisted vector index.

use gena_rag::document::Chunk;
use gena_rag::error::RagError;
use gena_rag::index::VectorIndex;
use proptest::prelude::*;
use tempfile::tempdir;

fn chunk(id: &str, text: &str, embedding: Vec<f32>) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: text.to_string(),
        source_offset: 0,
        embedding,
        document_id: "doc_1".to_string(),
    }
}

#[tokio::test]
async fn search_with_inserted_embedding_returns_that_chunk_first() {
    let dir = tempdir().unwrap();
    let index = VectorIndex::open(dir.path().join("kb.json")).unwrap();

    index
        .insert_batch(vec![
            chunk("a", "alpha", vec![1.0, 0.0, 0.0]),
            chunk("b", "beta", vec![0.0, 1.0, 0.0]),
            chunk("c", "gamma", vec![0.0, 0.0, 1.0]),
        ])
        .await
        .unwrap();

    let results = index.search(&[0.0, 1.0, 0.0], 3).await.unwrap();
    assert_eq!(results[0].chunk.id, "b");
    assert!((results[0].score - 1.0).abs() < 1e-6, "cosine self-similarity should be 1.0");
}

#[tokio::test]
async fn search_with_fewer_entries_than_k_returns_all() {
    let dir = tempdir().unwrap();
    let index = VectorIndex::open(dir.path().join("kb.json")).unwrap();

    index
        .insert_batch(vec![
            chunk("a", "alpha", vec![1.0, 0.0]),
            chunk("b", "beta", vec![0.0, 1.0]),
        ])
        .await
        .unwrap();

    let results = index.search(&[1.0, 1.0], 10).await.unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn search_on_empty_index_fails_with_empty_index() {
    let dir = tempdir().unwrap();
    let index = VectorIndex::open(dir.path().join("kb.json")).unwrap();

    let result = index.search(&[1.0, 0.0], 3).await;
    assert!(matches!(result, Err(RagError::EmptyIndex)));
}

#[tokio::test]
async fn search_rejects_zero_k() {
    let dir = tempdir().unwrap();
    let index = VectorIndex::open(dir.path().join("kb.json")).unwrap();
    index.insert_batch(vec![chunk("a", "alpha", vec![1.0])]).await.unwrap();

    let result = index.search(&[1.0], 0).await;
    assert!(matches!(result, Err(RagError::InvalidArgument(_))));
}

#[tokio::test]
async fn exact_score_ties_rank_earlier_insertions_first() {
    let dir = tempdir().unwrap();
    let index = VectorIndex::open(dir.path().join("kb.json")).unwrap();

    // Identical embeddings: every score ties exactly.
    index
        .insert_batch(vec![
            chunk("first", "one", vec![1.0, 0.0]),
            chunk("second", "two", vec![1.0, 0.0]),
            chunk("third", "three", vec![1.0, 0.0]),
        ])
        .await
        .unwrap();

    let results = index.search(&[1.0, 0.0], 3).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.chunk.id.as_str()).collect();
    assert_eq!(ids, ["first", "second", "third"]);
}

#[tokio::test]
async fn insert_rejects_dimension_mismatch_within_batch() {
    let dir = tempdir().unwrap();
    let index = VectorIndex::open(dir.path().join("kb.json")).unwrap();

    let result = index
        .insert_batch(vec![
            chunk("a", "alpha", vec![1.0, 0.0]),
            chunk("b", "beta", vec![1.0, 0.0, 0.0]),
        ])
        .await;

    assert!(matches!(result, Err(RagError::DimensionMismatch { expected: 2, actual: 3 })));
    // The batch was rejected before any mutation.
    assert_eq!(index.len().await, 0);
}

#[tokio::test]
async fn insert_rejects_dimension_mismatch_with_established_index() {
    let dir = tempdir().unwrap();
    let index = VectorIndex::open(dir.path().join("kb.json")).unwrap();
    index.insert_batch(vec![chunk("a", "alpha", vec![1.0, 0.0])]).await.unwrap();

    let result = index.insert_batch(vec![chunk("b", "beta", vec![1.0])]).await;
    assert!(matches!(result, Err(RagError::DimensionMismatch { expected: 2, actual: 1 })));
    assert_eq!(index.len().await, 1);
}

#[tokio::test]
async fn query_of_wrong_dimensionality_is_rejected() {
    let dir = tempdir().unwrap();
    let index = VectorIndex::open(dir.path().join("kb.json")).unwrap();
    index.insert_batch(vec![chunk("a", "alpha", vec![1.0, 0.0])]).await.unwrap();

    let result = index.search(&[1.0, 0.0, 0.0], 1).await;
    assert!(matches!(result, Err(RagError::DimensionMismatch { .. })));
}

// ── Persistence ─────────────────────────────────────────────────────

#[tokio::test]
async fn persist_then_load_yields_identical_entries_in_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kb.json");

    let batch = vec![
        chunk("a", "alpha", vec![1.0, 0.0]),
        chunk("b", "beta", vec![0.0, 1.0]),
        chunk("c", "gamma", vec![0.5, 0.5]),
    ];

    {
        let index = VectorIndex::open(&path).unwrap();
        index.insert_batch(batch.clone()).await.unwrap();
    }

    let reloaded = VectorIndex::open(&path).unwrap();
    assert_eq!(reloaded.len().await, 3);
    assert_eq!(reloaded.dimensions().await, Some(2));

    // Order and content survive the round trip exactly.
    let results = reloaded.search(&[1.0, 0.0], 3).await.unwrap();
    assert_eq!(results[0].chunk, batch[0]);
}

#[tokio::test]
async fn open_on_missing_store_yields_empty_index() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("never_written.json");

    let index = VectorIndex::open(&path).unwrap();
    assert!(index.is_empty().await);
    assert!(!VectorIndex::exists(&path));
}

#[tokio::test]
async fn open_on_corrupted_store_fails_with_corrupt_index() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kb.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let result = VectorIndex::open(&path);
    assert!(matches!(result, Err(RagError::CorruptIndex { .. })));
}

#[tokio::test]
async fn open_on_unsupported_version_fails_with_corrupt_index() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kb.json");
    std::fs::write(
        &path,
        br#"{"version": 99, "dimensions": null, "created_at": "2024-01-01T00:00:00Z", "entries": []}"#,
    )
    .unwrap();

    let result = VectorIndex::open(&path);
    assert!(matches!(result, Err(RagError::CorruptIndex { .. })));
}

#[tokio::test]
async fn storage_failure_rolls_back_the_whole_batch() {
    let dir = tempdir().unwrap();
    // The parent directory does not exist, so persistence must fail.
    let path = dir.path().join("missing_dir").join("kb.json");

    let index = VectorIndex::open(&path).unwrap();
    let result = index
        .insert_batch(vec![
            chunk("a", "alpha", vec![1.0, 0.0]),
            chunk("b", "beta", vec![0.0, 1.0]),
        ])
        .await;

    assert!(matches!(result, Err(RagError::Storage { .. })));

    // In-memory state rolled back: no partial subset survives.
    assert_eq!(index.len().await, 0);
    assert!(matches!(index.search(&[1.0, 0.0], 1).await, Err(RagError::EmptyIndex)));

    // Nothing was persisted either.
    assert!(!VectorIndex::exists(&path));
    assert!(VectorIndex::open(&path).unwrap().is_empty().await);
}

#[tokio::test]
async fn exists_reports_store_presence_without_loading() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kb.json");
    assert!(!VectorIndex::exists(&path));

    let index = VectorIndex::open(&path).unwrap();
    index.insert_batch(vec![chunk("a", "alpha", vec![1.0])]).await.unwrap();
    assert!(VectorIndex::exists(&path));
}

// ── Search ordering property ────────────────────────────────────────

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// For any set of stored embeddings, search returns results ordered by
    /// descending cosine similarity, bounded by both `k` and the entry
    /// count.
    #[test]
    fn search_results_ordered_descending_and_bounded(
        embeddings in proptest::collection::vec(arb_normalized_embedding(8), 1..20),
        query in arb_normalized_embedding(8),
        k in 1usize..25,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (results, count) = rt.block_on(async {
            let dir = tempdir().unwrap();
            let index = VectorIndex::open(dir.path().join("kb.json")).unwrap();

            let chunks: Vec<Chunk> = embeddings
                .iter()
                .enumerate()
                .map(|(i, e)| chunk(&format!("c{i}"), "text", e.clone()))
                .collect();
            let count = chunks.len();

            index.insert_batch(chunks).await.unwrap();
            (index.search(&query, k).await.unwrap(), count)
        });

        prop_assert!(results.len() <= k);
        prop_assert!(results.len() <= count);
        for window in results.windows(2) {
            prop_assert!(
                window[0].score >= window[1].score,
                "results not in descending order: {} < {}",
                window[0].score,
                window[1].score,
            );
        }
    }
}
