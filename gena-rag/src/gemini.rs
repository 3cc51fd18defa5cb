//! Gemini embedding provider using the `gena-gemini` crate.
//!
//! This module is only available when the `gemini` feature is enabled.

use async_trait::async_trait;
use tracing::{debug, error};

use gena_gemini::{Error as GeminiError, Gemini, Model};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// An [`EmbeddingProvider`] backed by the Gemini embedding API.
///
/// # Example
///
/// ```rust,ignore
/// use gena_rag::gemini::GeminiEmbeddingProvider;
///
/// let provider = GeminiEmbeddingProvider::new("your-api-key")?;
/// let embedding = provider.embed("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
pub struct GeminiEmbeddingProvider {
    client: Gemini,
    dimensions: usize,
}

impl GeminiEmbeddingProvider {
    /// Embedding dimensions for `text-embedding-004`.
    const DEFAULT_DIMENSIONS: usize = 768;

    /// Create a new provider using the given API key and the default
    /// `text-embedding-004` model.
    pub fn new(api_key: impl AsRef<str>) -> Result<Self> {
        let client =
            Gemini::new(api_key, Model::TextEmbedding004).map_err(|e| RagError::Embedding {
                provider: "Gemini".into(),
                message: format!("failed to create Gemini client: {e}"),
            })?;
        Ok(Self { client, dimensions: Self::DEFAULT_DIMENSIONS })
    }

    /// Create a new provider from an existing [`Gemini`] client.
    ///
    /// Use this to share deadline or base-URL configuration with the
    /// generation client.
    pub fn from_client(client: Gemini) -> Self {
        Self { client, dimensions: Self::DEFAULT_DIMENSIONS }
    }
}

fn map_error(error: GeminiError) -> RagError {
    match error {
        GeminiError::DeadlineExceeded { deadline, .. } => {
            RagError::UpstreamTimeout { seconds: deadline.as_secs() }
        }
        other => RagError::Embedding { provider: "Gemini".into(), message: other.to_string() },
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Gemini", text_len = text.len(), "embedding single text");

        self.client.embed_content(text).await.map_err(|e| {
            error!(provider = "Gemini", error = %e, "embedding request failed");
            map_error(e)
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "Gemini", batch_size = texts.len(), "embedding batch");

        self.client.batch_embed_contents(texts).await.map_err(|e| {
            error!(provider = "Gemini", error = %e, "batch embedding request failed");
            map_error(e)
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
