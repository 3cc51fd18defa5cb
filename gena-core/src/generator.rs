//! Generation capability trait consumed by the assistant handlers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An image attached inline to a generation request.
///
/// The data is base64-encoded, matching the wire format of the hosted
/// generation APIs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InlineImage {
    /// MIME type of the image (`image/png`, `image/jpeg`).
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

/// A composed request for the generation backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Optional system-level instruction prepended to the conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    /// The user-facing prompt text.
    pub prompt: String,
    /// Optional inline image for multimodal requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<InlineImage>,
}

impl GenerationRequest {
    /// Create a text-only request with no instruction.
    pub fn text(prompt: impl Into<String>) -> Self {
        Self { instruction: None, prompt: prompt.into(), image: None }
    }

    /// Set the system instruction.
    #[must_use]
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Attach an inline image.
    #[must_use]
    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }
}

/// A backend that turns a composed prompt into generated text.
///
/// Calls are blocking network I/O from the caller's perspective and must
/// respect a deadline internally; an expired deadline surfaces as
/// [`AssistantError::UpstreamTimeout`](crate::AssistantError::UpstreamTimeout)
/// rather than hanging.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: GenerationRequest) -> Result<String>;

    /// The backend's model name, for display and logging.
    fn name(&self) -> &str;
}
