//! [`Generator`] implementation backed by the Gemini API.

use async_trait::async_trait;
use tracing::{debug, error};

use gena_core::{AssistantError, GenerationRequest, Generator};

use crate::client::{Error, Gemini};
use crate::generation::{GenerateContentRequest, InlineData};

/// A [`Generator`] that delegates to a [`Gemini`] client.
///
/// Client errors map onto the assistant's boundary taxonomy: an expired
/// deadline becomes `UpstreamTimeout`, everything else becomes a `Model`
/// failure with a human-readable message.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: Gemini,
}

impl GeminiGenerator {
    /// Wrap an existing client.
    pub fn new(client: Gemini) -> Self {
        Self { client }
    }
}

fn map_error(error: Error) -> AssistantError {
    match error {
        Error::DeadlineExceeded { deadline, .. } => {
            AssistantError::UpstreamTimeout { seconds: deadline.as_secs() }
        }
        other => AssistantError::Model(other.to_string()),
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, request: GenerationRequest) -> gena_core::Result<String> {
        debug!(model = %self.client.model(), prompt_len = request.prompt.len(), "generating");

        let image = request
            .image
            .map(|img| InlineData { mime_type: img.mime_type, data: img.data });
        let wire = GenerateContentRequest::new(request.instruction, request.prompt, image);

        let response = self.client.generate_content(&wire).await.map_err(|e| {
            error!(error = %e, "generation request failed");
            map_error(e)
        })?;

        let text = response.text();
        if text.is_empty() {
            return Err(AssistantError::Model("model returned no text candidates".into()));
        }
        Ok(text)
    }

    fn name(&self) -> &str {
        self.client.model().as_str()
    }
}
