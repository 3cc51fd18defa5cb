//! The boundary error type for assistant operations.

use thiserror::Error;

/// Errors surfaced to the assistant's caller.
///
/// Provider and tool crates keep their own error enums internally and map
/// onto this type at the boundary, so the surface layer has a single
/// taxonomy to render.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// The generation backend failed or returned an unusable response.
    #[error("Model error: {0}")]
    Model(String),

    /// An upstream call exceeded its deadline.
    #[error("Upstream call timed out after {seconds}s")]
    UpstreamTimeout {
        /// The deadline that was exceeded, in seconds.
        seconds: u64,
    },

    /// Input bytes were not valid UTF-8.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A tool (dataset lookup, research search) failed.
    #[error("Tool error: {0}")]
    Tool(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A local I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A convenience result type for assistant operations.
pub type Result<T> = std::result::Result<T, AssistantError>;
