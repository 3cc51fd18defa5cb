//! RAG pipeline orchestrator.
//!
//! [`RagPipeline`] coordinates the two external-facing operations over a
//! shared [`VectorIndex`]:
//!
//! - `index_document`: text → [`Chunker`] → [`EmbeddingProvider`] →
//!   [`VectorIndex::insert_batch`], as one logical transaction;
//! - `answer`: question → embed → search → [`ContextAssembler`] →
//!   grounded prompt → `Generator`, with a fixed "no knowledge base"
//!   response when the index is empty (the generator is never called on
//!   that path).
//!
//! # Example
//!
//! ```rust,ignore
//! use gena_rag::{RagPipeline, RagConfig, VectorIndex};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .index(Arc::new(VectorIndex::open("kb_index.json")?))
//!     .build()?;
//!
//! pipeline.index_document(&document).await?;
//! let answer = pipeline.answer("what does the document say?", &generator).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};

use gena_core::{GenerationRequest, Generator};

use crate::assembler::ContextAssembler;
use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// The fixed response returned when no knowledge base exists yet.
pub const NO_KNOWLEDGE_RESPONSE: &str =
    "No knowledge base found. Upload a document and index it before asking questions.";

/// System instruction for grounded answering.
const GROUNDED_INSTRUCTION: &str = "You are a knowledge assistant. Answer the question strictly \
     using the provided document content. If the answer is not in the content, say you do not \
     know.";

/// System instruction when retrieval produced no usable context.
const NO_CONTEXT_INSTRUCTION: &str = "You are a knowledge assistant. No document content matched \
     the question. Tell the user that the knowledge base holds no relevant information; do not \
     answer from general knowledge.";

/// The RAG pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`]. Operations are
/// serialized against each other by the index's internal locking; a
/// query observes either the complete pre- or post-state of any index
/// update, never an interleaving.
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    index: Arc<VectorIndex>,
    chunker: Arc<dyn Chunker>,
    assembler: ContextAssembler,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the shared vector index.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    /// Index a document: chunk → embed → insert.
    ///
    /// The whole operation is one logical transaction: embedding happens
    /// before any index mutation, and the batch insert rolls back on
    /// storage failure, so either all chunks of the document are indexed
    /// or none are.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Pipeline`] wrapping the failing stage, with
    /// the document ID in the message.
    pub async fn index_document(&self, document: &Document) -> Result<Vec<Chunk>> {
        let mut chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            info!(document.id = %document.id, chunk_count = 0, "indexed document (empty)");
            return Ok(chunks);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "embedding failed during indexing");
            RagError::Pipeline(format!("embedding failed for document '{}': {e}", document.id))
        })?;

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.index.insert_batch(chunks.clone()).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "insert failed during indexing");
            RagError::Pipeline(format!("insert failed for document '{}': {e}", document.id))
        })?;

        info!(document.id = %document.id, chunk_count = chunks.len(), "indexed document");
        Ok(chunks)
    }

    /// Retrieve the top matches for a question: embed → search → filter.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyIndex`] when the index has no entries
    /// (callers treat this as the "no knowledge" path, not a failure),
    /// and [`RagError::Pipeline`] when embedding or search fails.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedding_provider.embed(question).await.map_err(|e| {
            error!(error = %e, "embedding failed during query");
            RagError::Pipeline(format!("query embedding failed: {e}"))
        })?;

        let results = match self.index.search(&query_embedding, self.config.top_k).await {
            Ok(results) => results,
            Err(RagError::EmptyIndex) => return Err(RagError::EmptyIndex),
            Err(e) => {
                error!(error = %e, "index search failed");
                return Err(RagError::Pipeline(format!("search failed: {e}")));
            }
        };

        let threshold = self.config.similarity_threshold;
        let filtered: Vec<SearchResult> =
            results.into_iter().filter(|r| r.score >= threshold).collect();

        info!(result_count = filtered.len(), "retrieval completed");
        Ok(filtered)
    }

    /// Answer a question grounded in the indexed knowledge.
    ///
    /// Short-circuits to [`NO_KNOWLEDGE_RESPONSE`] without calling the
    /// generator when the index is absent or empty. With an empty
    /// retrieval (nothing above the similarity threshold) the generator
    /// is instructed to say it does not know rather than answer freely.
    pub async fn answer(
        &self,
        question: &str,
        generator: &dyn Generator,
    ) -> gena_core::Result<String> {
        if self.index.is_empty().await {
            info!("query against empty index, returning fixed response");
            return Ok(NO_KNOWLEDGE_RESPONSE.to_string());
        }

        let results = match self.retrieve(question).await {
            Ok(results) => results,
            // The index emptied between the check and the search; same
            // fixed response, still no generator call.
            Err(RagError::EmptyIndex) => return Ok(NO_KNOWLEDGE_RESPONSE.to_string()),
            Err(e) => return Err(e.into()),
        };

        let context = self.assembler.assemble(&results);
        let request = compose_grounded_prompt(question, &context);
        generator.generate(request).await
    }
}

/// Compose the grounded prompt from the assembled context and question.
///
/// An empty context takes the distinct no-context path: the instruction
/// tells the generator to say it does not know.
fn compose_grounded_prompt(question: &str, context: &str) -> GenerationRequest {
    if context.is_empty() {
        GenerationRequest::text(format!("USER QUESTION: {question}"))
            .with_instruction(NO_CONTEXT_INSTRUCTION)
    } else {
        GenerationRequest::text(format!(
            "DOCUMENT CONTENT:\n{context}\n\nUSER QUESTION: {question}"
        ))
        .with_instruction(GROUNDED_INSTRUCTION)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `embedding_provider`, and `index` are required; the chunker
/// and assembler default to the configured [`FixedSizeChunker`] and
/// [`ContextAssembler`].
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<Arc<VectorIndex>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the shared vector index.
    pub fn index(mut self, index: Arc<VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    /// Override the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required field is missing, or
    /// [`RagError::InvalidArgument`] if the default chunker cannot be
    /// constructed from the config's chunking parameters.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self.config.ok_or_else(|| RagError::Config("config is required".into()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".into()))?;
        let index = self.index.ok_or_else(|| RagError::Config("index is required".into()))?;

        let chunker = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::try_new(config.chunk_size, config.chunk_overlap)?),
        };
        let assembler = ContextAssembler::new(config.max_context_chars);

        Ok(RagPipeline { config, embedding_provider, index, chunker, assembler })
    }
}
