//! Error types for the `gena-rag` crate.

use gena_core::AssistantError;
use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A caller supplied an invalid parameter (bad chunking arguments,
    /// zero `k`, query of the wrong shape).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An embedding's length disagrees with the index's established
    /// dimensionality.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The index's established dimensionality.
        expected: usize,
        /// The offending embedding's length.
        actual: usize,
    },

    /// A search was attempted against an index with zero entries.
    #[error("The index is empty")]
    EmptyIndex,

    /// Durable storage failed; in-memory state has been rolled back.
    #[error("Storage error: {message}")]
    Storage {
        /// A description of the failure.
        message: String,
    },

    /// The persisted store exists but cannot be read back.
    #[error("Corrupt index at '{path}': {message}")]
    CorruptIndex {
        /// The store path.
        path: String,
        /// A description of the corruption.
        message: String,
    },

    /// The embedding provider failed.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An upstream call exceeded its deadline.
    #[error("Upstream call timed out after {seconds}s")]
    UpstreamTimeout {
        /// The deadline that was exceeded, in seconds.
        seconds: u64,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error in the pipeline orchestration.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

impl From<RagError> for AssistantError {
    fn from(error: RagError) -> Self {
        match error {
            RagError::UpstreamTimeout { seconds } => AssistantError::UpstreamTimeout { seconds },
            other => AssistantError::Tool(other.to_string()),
        }
    }
}
