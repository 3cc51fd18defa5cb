//! The Gemini HTTP client.

use std::fmt::{self, Formatter};
use std::sync::LazyLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use tracing::debug;
use url::Url;

use crate::embedding::{
    BatchEmbedEntry, BatchEmbedRequest, BatchEmbedResponse, EmbedRequest, EmbedResponse,
};
use crate::generation::{Content, GenerateContentRequest, GenerationResponse};

static DEFAULT_BASE_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse("https://generativelanguage.googleapis.com/v1beta/")
        .expect("unreachable error: failed to parse default base URL")
});

/// Default deadline applied to every API call.
const DEFAULT_DEADLINE: Duration = Duration::from_secs(60);

/// A Gemini model identifier.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Model {
    /// `gemini-2.5-flash`, the default generation model.
    #[default]
    #[serde(rename = "models/gemini-2.5-flash")]
    Gemini25Flash,
    /// `gemini-2.5-pro`.
    #[serde(rename = "models/gemini-2.5-pro")]
    Gemini25Pro,
    /// `text-embedding-004`, the default embedding model (768 dimensions).
    #[serde(rename = "models/text-embedding-004")]
    TextEmbedding004,
    /// Any other model, by its full `models/...` name.
    #[serde(untagged)]
    Custom(String),
}

impl Model {
    /// The full `models/...` name used in request paths.
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gemini25Flash => "models/gemini-2.5-flash",
            Model::Gemini25Pro => "models/gemini-2.5-pro",
            Model::TextEmbedding004 => "models/text-embedding-004",
            Model::Custom(model) => model,
        }
    }
}

impl From<String> for Model {
    fn from(model: String) -> Self {
        match model.as_str() {
            "gemini-2.5-flash" | "models/gemini-2.5-flash" => Model::Gemini25Flash,
            "gemini-2.5-pro" | "models/gemini-2.5-pro" => Model::Gemini25Pro,
            "text-embedding-004" | "models/text-embedding-004" => Model::TextEmbedding004,
            _ if model.starts_with("models/") => Model::Custom(model),
            _ => Model::Custom(format!("models/{model}")),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by the Gemini client.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The API key contained bytes that cannot appear in a header.
    #[snafu(display("failed to parse API key"))]
    InvalidApiKey { source: InvalidHeaderValue },

    /// The request URL could not be constructed.
    #[snafu(display("failed to construct URL (probably incorrect model name): {suffix}"))]
    ConstructUrl { source: url::ParseError, suffix: String },

    /// The HTTP request failed before a response arrived.
    #[snafu(display("failed to perform request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    /// The server answered with a non-success status.
    #[snafu(display(
        "bad response from server; code {code}; description: {}",
        description.as_deref().unwrap_or("none")
    ))]
    BadResponse {
        /// HTTP status code.
        code: u16,
        /// HTTP error body, if readable.
        description: Option<String>,
    },

    /// The response body could not be deserialized.
    #[snafu(display("failed to deserialize JSON response"))]
    DecodeResponse { source: reqwest::Error },

    /// The call exceeded its deadline.
    #[snafu(display("request to '{url}' exceeded the {}s deadline", deadline.as_secs()))]
    DeadlineExceeded { url: Url, deadline: Duration },
}

/// Client for the Gemini REST API.
///
/// Authentication uses the `x-goog-api-key` header. Every call runs under
/// the configured deadline and fails with [`Error::DeadlineExceeded`] when
/// it expires, so callers can treat upstream calls as
/// cancellable-with-timeout operations.
#[derive(Debug, Clone)]
pub struct Gemini {
    http_client: Client,
    model: Model,
    base_url: Url,
    deadline: Duration,
}

impl Gemini {
    /// Create a client for the given model with the default endpoint.
    pub fn new(api_key: impl AsRef<str>, model: impl Into<Model>) -> Result<Self, Error> {
        let headers = HeaderMap::from_iter([(
            HeaderName::from_static("x-goog-api-key"),
            HeaderValue::from_str(api_key.as_ref()).context(InvalidApiKeySnafu)?,
        )]);

        let http_client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("all parameters must be valid");

        Ok(Self {
            http_client,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.clone(),
            deadline: DEFAULT_DEADLINE,
        })
    }

    /// Override the base URL (testing, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Override the per-call deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// The model this client addresses.
    pub fn model(&self) -> &Model {
        &self.model
    }

    fn endpoint(&self, method: &str) -> Result<Url, Error> {
        let suffix = format!("{}:{method}", self.model.as_str());
        self.base_url.join(&suffix).context(ConstructUrlSnafu { suffix })
    }

    /// Check the response status code and return an error if it is not successful.
    async fn check_response(response: Response) -> Result<Response, Error> {
        let status = response.status();
        if !status.is_success() {
            let description = response.text().await.ok();
            BadResponseSnafu { code: status.as_u16(), description }.fail()
        } else {
            Ok(response)
        }
    }

    /// POST `body` to `{model}:{method}` under the configured deadline.
    async fn post<Req: Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &Req,
    ) -> Result<Resp, Error> {
        let url = self.endpoint(method)?;
        debug!(%url, deadline_secs = self.deadline.as_secs(), "gemini request");

        let send = self.http_client.post(url.clone()).json(body).send();
        let response = tokio::time::timeout(self.deadline, send)
            .await
            .map_err(|_| Error::DeadlineExceeded { url: url.clone(), deadline: self.deadline })?
            .context(PerformRequestSnafu { url: url.clone() })?;

        let response = Self::check_response(response).await?;

        // The body read shares the deadline with the request itself.
        tokio::time::timeout(self.deadline, response.json::<Resp>())
            .await
            .map_err(|_| Error::DeadlineExceeded { url, deadline: self.deadline })?
            .context(DecodeResponseSnafu)
    }

    /// Generate content for the given request.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        self.post("generateContent", request).await
    }

    /// Embed a single text, returning its vector.
    pub async fn embed_content(&self, text: &str) -> Result<Vec<f32>, Error> {
        let request = EmbedRequest { content: Content::user(vec![crate::Part::Text(text.into())]) };
        let response: EmbedResponse = self.post("embedContent", &request).await?;
        Ok(response.embedding.values)
    }

    /// Embed a batch of texts, returning vectors in input order.
    pub async fn batch_embed_contents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, Error> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| BatchEmbedEntry {
                    model: self.model.as_str().to_string(),
                    content: Content::user(vec![crate::Part::Text((*text).to_string())]),
                })
                .collect(),
        };
        let response: BatchEmbedResponse = self.post("batchEmbedContents", &request).await?;
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_names_normalize_to_full_paths() {
        assert_eq!(Model::from("gemini-2.5-flash".to_string()), Model::Gemini25Flash);
        assert_eq!(
            Model::from("models/text-embedding-004".to_string()),
            Model::TextEmbedding004
        );
        assert_eq!(
            Model::from("gemini-1.5-pro".to_string()).as_str(),
            "models/gemini-1.5-pro"
        );
        assert_eq!(
            Model::from("models/custom-tuned".to_string()).as_str(),
            "models/custom-tuned"
        );
    }
}
