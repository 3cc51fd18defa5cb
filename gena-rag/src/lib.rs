//! Retrieval-augmented generation core for gena.
//!
//! The flow is a single pipeline composed per operation:
//!
//! - index: text → [`Chunker`] → [`EmbeddingProvider`] → [`VectorIndex`]
//! - query: question → [`EmbeddingProvider`] → [`VectorIndex::search`] →
//!   [`ContextAssembler`] → grounded prompt → `Generator`
//!
//! The [`VectorIndex`] is an append-only, persisted nearest-neighbor store
//! with exact cosine top-k search; [`RagPipeline`] orchestrates both entry
//! points and owns the transactional contract (a document is indexed fully
//! or not at all).

pub mod assembler;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod index;
pub mod pipeline;

pub use assembler::ContextAssembler;
pub use chunking::{Chunker, FixedSizeChunker};
pub use config::RagConfig;
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
#[cfg(feature = "gemini")]
pub use gemini::GeminiEmbeddingProvider;
pub use index::VectorIndex;
pub use pipeline::{NO_KNOWLEDGE_RESPONSE, RagPipeline, RagPipelineBuilder};
