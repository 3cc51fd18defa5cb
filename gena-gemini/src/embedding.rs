//! Wire types for the `embedContent` endpoints.

use serde::{Deserialize, Serialize};

use crate::generation::Content;

/// Request body for `{model}:embedContent`.
#[derive(Debug, Clone, Serialize)]
pub struct EmbedRequest {
    /// The text to embed, wrapped in a content block.
    pub content: Content,
}

/// A single embedding vector.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ContentEmbedding {
    /// The vector components.
    pub values: Vec<f32>,
}

/// Response body for `{model}:embedContent`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbedResponse {
    /// The embedding for the request content.
    pub embedding: ContentEmbedding,
}

/// One entry of a batch embedding request.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEmbedEntry {
    /// The fully qualified model name, required per entry by the API.
    pub model: String,
    /// The text to embed.
    pub content: Content,
}

/// Request body for `{model}:batchEmbedContents`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEmbedRequest {
    /// The per-text requests, in order.
    pub requests: Vec<BatchEmbedEntry>,
}

/// Response body for `{model}:batchEmbedContents`.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchEmbedResponse {
    /// Embeddings in the same order as the request entries.
    pub embeddings: Vec<ContentEmbedding>,
}
