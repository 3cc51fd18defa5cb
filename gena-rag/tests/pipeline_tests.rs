//! End-to-end pipeline tests with mock embedding and generation backends.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::tempdir;

use gena_core::{GenerationRequest, Generator};
use gena_rag::document::Document;
use gena_rag::embedding::EmbeddingProvider;
use gena_rag::error::RagError;
use gena_rag::index::VectorIndex;
use gena_rag::pipeline::NO_KNOWLEDGE_RESPONSE;
use gena_rag::{RagConfig, RagPipeline};

const DIM: usize = 3;

/// Deterministic keyword embedder: texts about cats, dogs, and everything
/// else land on three orthogonal axes.
struct KeywordEmbedder;

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> gena_rag::Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(if lower.contains("cat") {
            vec![1.0, 0.0, 0.0]
        } else if lower.contains("dog") {
            vec![0.0, 1.0, 0.0]
        } else {
            vec![0.0, 0.0, 1.0]
        })
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// An embedder that always fails, for transaction tests.
struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> gena_rag::Result<Vec<f32>> {
        Err(RagError::Embedding { provider: "mock".into(), message: "unavailable".into() })
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// A generator that records the request it received.
#[derive(Default)]
struct RecordingGenerator {
    last_request: Mutex<Option<GenerationRequest>>,
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, request: GenerationRequest) -> gena_core::Result<String> {
        *self.last_request.lock().unwrap() = Some(request);
        Ok("generated answer".to_string())
    }

    fn name(&self) -> &str {
        "recording-mock"
    }
}

/// A generator that must never be called.
struct UnreachableGenerator;

#[async_trait]
impl Generator for UnreachableGenerator {
    async fn generate(&self, _request: GenerationRequest) -> gena_core::Result<String> {
        panic!("generator must not be called on the no-knowledge path");
    }

    fn name(&self) -> &str {
        "unreachable-mock"
    }
}

fn pipeline_at(
    path: std::path::PathBuf,
    embedder: Arc<dyn EmbeddingProvider>,
    config: RagConfig,
) -> RagPipeline {
    RagPipeline::builder()
        .config(config)
        .embedding_provider(embedder)
        .index(Arc::new(VectorIndex::open(path).unwrap()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn query_on_absent_knowledge_base_skips_the_generator() {
    let dir = tempdir().unwrap();
    let pipeline = pipeline_at(
        dir.path().join("kb.json"),
        Arc::new(KeywordEmbedder),
        RagConfig::default(),
    );

    let answer = pipeline.answer("anything at all?", &UnreachableGenerator).await.unwrap();
    assert_eq!(answer, NO_KNOWLEDGE_RESPONSE);
}

#[tokio::test]
async fn index_then_answer_grounds_the_prompt_in_retrieved_context() {
    let dir = tempdir().unwrap();
    let pipeline = pipeline_at(
        dir.path().join("kb.json"),
        Arc::new(KeywordEmbedder),
        RagConfig::default(),
    );

    let document = Document::new("pets", "The cat sleeps on the windowsill all afternoon.");
    let chunks = pipeline.index_document(&document).await.unwrap();
    assert_eq!(chunks.len(), 1);

    let generator = RecordingGenerator::default();
    let answer = pipeline.answer("where does the cat sleep?", &generator).await.unwrap();
    assert_eq!(answer, "generated answer");

    let request = generator.last_request.lock().unwrap().clone().unwrap();
    assert!(request.prompt.contains("The cat sleeps on the windowsill"));
    assert!(request.prompt.contains("where does the cat sleep?"));
    assert!(request.instruction.unwrap().contains("strictly"));
}

#[tokio::test]
async fn retrieval_below_threshold_takes_the_no_context_path() {
    let dir = tempdir().unwrap();
    let config = RagConfig::builder().similarity_threshold(0.9).build().unwrap();
    let pipeline =
        pipeline_at(dir.path().join("kb.json"), Arc::new(KeywordEmbedder), config);

    pipeline
        .index_document(&Document::new("pets", "The cat sleeps here."))
        .await
        .unwrap();

    // A dog query is orthogonal to every cat chunk, so nothing survives
    // the threshold and the generator is told to say it does not know.
    let generator = RecordingGenerator::default();
    pipeline.answer("what about the dog?", &generator).await.unwrap();

    let request = generator.last_request.lock().unwrap().clone().unwrap();
    assert!(!request.prompt.contains("DOCUMENT CONTENT"));
    assert!(request.instruction.unwrap().contains("No document content matched"));
}

#[tokio::test]
async fn embedding_failure_aborts_indexing_before_any_mutation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kb.json");
    let pipeline =
        pipeline_at(path.clone(), Arc::new(FailingEmbedder), RagConfig::default());

    let result = pipeline
        .index_document(&Document::new("doc", "some content to index"))
        .await;
    assert!(matches!(result, Err(RagError::Pipeline(_))));

    // Nothing was committed: the store was never created.
    assert!(!VectorIndex::exists(&path));
    assert!(pipeline.index().is_empty().await);
}

#[tokio::test]
async fn three_thousand_char_document_indexes_as_four_chunks() {
    let dir = tempdir().unwrap();
    let config =
        RagConfig::builder().chunk_size(1000).chunk_overlap(100).build().unwrap();
    let pipeline =
        pipeline_at(dir.path().join("kb.json"), Arc::new(KeywordEmbedder), config);

    let document = Document::new("big", "x".repeat(3000));
    let chunks = pipeline.index_document(&document).await.unwrap();

    assert_eq!(chunks.len(), 4);
    assert_eq!(pipeline.index().len().await, 4);
}

#[tokio::test]
async fn indexing_appends_across_documents() {
    let dir = tempdir().unwrap();
    let pipeline = pipeline_at(
        dir.path().join("kb.json"),
        Arc::new(KeywordEmbedder),
        RagConfig::default(),
    );

    pipeline.index_document(&Document::new("a", "cat facts")).await.unwrap();
    pipeline.index_document(&Document::new("b", "dog facts")).await.unwrap();

    assert_eq!(pipeline.index().len().await, 2);

    let results = pipeline.retrieve("tell me about the dog").await.unwrap();
    assert_eq!(results[0].chunk.document_id, "b");
}

#[tokio::test]
async fn builder_requires_an_embedding_provider() {
    let dir = tempdir().unwrap();
    let result = RagPipeline::builder()
        .config(RagConfig::default())
        .index(Arc::new(VectorIndex::open(dir.path().join("kb.json")).unwrap()))
        .build();
    assert!(matches!(result, Err(RagError::Config(_))));
}
