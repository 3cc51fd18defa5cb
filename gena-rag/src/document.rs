//! Data types for documents, chunks, and search results.

use serde::{Deserialize, Serialize};

/// A source document containing text content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
}

impl Document {
    /// Create a document from an id and its text.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// A segment of a [`Document`] with its vector embedding.
///
/// A chunk paired with a non-empty embedding is the unit the
/// [`VectorIndex`](crate::VectorIndex) persists. Chunks are immutable once
/// inserted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier, derived as `{document_id}_{chunk_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Byte offset of this chunk's start within the source document.
    pub source_offset: usize,
    /// The vector embedding for this chunk's text. Empty until the
    /// pipeline attaches one.
    pub embedding: Vec<f32>,
    /// The ID of the parent [`Document`].
    pub document_id: String,
}

/// A retrieved [`Chunk`] paired with a relevance score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}
