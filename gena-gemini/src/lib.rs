//! Client for the Google Gemini REST API.
//!
//! Supports text generation, multimodal (text + inline image) generation,
//! and content embedding. Every network call runs under a configurable
//! deadline; an expired deadline surfaces as [`Error::DeadlineExceeded`],
//! never a hang.
//!
//! # Example
//!
//! ```rust,ignore
//! use gena_gemini::{Gemini, Model};
//!
//! let client = Gemini::new(api_key, Model::Gemini25Flash)?;
//! let response = client.generate_content(&request).await?;
//! println!("{}", response.text());
//! ```

mod client;
mod embedding;
mod generation;
mod generator;

pub use client::{Error, Gemini, Model};
pub use embedding::{
    BatchEmbedEntry, BatchEmbedRequest, BatchEmbedResponse, ContentEmbedding, EmbedRequest,
    EmbedResponse,
};
pub use generation::{
    Candidate, Content, GenerateContentRequest, GenerationResponse, InlineData, Part,
};
pub use generator::GeminiGenerator;
