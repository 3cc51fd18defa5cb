//! Error types for the `gena-tools` crate.

use gena_core::AssistantError;
use thiserror::Error;

/// Errors from the external collaborator tools.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The medical dataset could not be loaded or read.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// The research search failed.
    #[error("Research search error: {0}")]
    Research(String),
}

/// A convenience result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;

impl From<ToolError> for AssistantError {
    fn from(error: ToolError) -> Self {
        AssistantError::Tool(error.to_string())
    }
}
