//! Wire types for the `generateContent` endpoint.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

/// Inline binary data (an image) carried in a request part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type of the data.
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

impl InlineData {
    /// Base64-encode raw bytes into an inline data part.
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self { mime_type: mime_type.into(), data: BASE64.encode(bytes) }
    }
}

/// A single part of a content block: text or inline data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Part {
    /// Plain text.
    #[serde(rename = "text")]
    Text(String),
    /// Inline binary data such as an image.
    #[serde(rename = "inlineData")]
    InlineData(InlineData),
}

/// A role-tagged sequence of parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Content {
    /// Author role (`user` or `model`). Omitted for system instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// The content parts, in order.
    pub parts: Vec<Part>,
}

impl Content {
    /// A user-role content block with the given parts.
    pub fn user(parts: Vec<Part>) -> Self {
        Self { role: Some("user".to_string()), parts }
    }

    /// A role-less content block holding a single text part, used for
    /// system instructions.
    pub fn system(text: impl Into<String>) -> Self {
        Self { role: None, parts: vec![Part::Text(text.into())] }
    }
}

/// Request body for `{model}:generateContent`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The conversation contents.
    pub contents: Vec<Content>,
    /// Optional system instruction applied to the whole request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
}

impl GenerateContentRequest {
    /// Build a request from an instruction, prompt text, and optional image.
    pub fn new(instruction: Option<String>, prompt: String, image: Option<InlineData>) -> Self {
        let mut parts = vec![Part::Text(prompt)];
        if let Some(image) = image {
            parts.push(Part::InlineData(image));
        }
        Self {
            contents: vec![Content::user(parts)],
            system_instruction: instruction.map(Content::system),
        }
    }
}

/// One candidate answer in a generation response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The generated content. Absent when the candidate was blocked.
    pub content: Option<Content>,
    /// Why generation stopped (`STOP`, `MAX_TOKENS`, `SAFETY`, ...).
    pub finish_reason: Option<String>,
}

/// Response body for `{model}:generateContent`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// The candidate completions, best first.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// The model version that served the request.
    pub model_version: Option<String>,
}

impl GenerationResponse {
    /// Concatenated text of the first candidate, empty if none.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| match part {
                        Part::Text(text) => Some(text.as_str()),
                        Part::InlineData(_) => None,
                    })
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}
