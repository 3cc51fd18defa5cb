//! Core types shared across the gena workspace.
//!
//! This crate defines the boundary error type ([`AssistantError`]), the
//! [`Generator`] capability trait that provider crates implement, and the
//! in-memory chat [`Transcript`] used by the interactive surface.

mod error;
mod generator;
mod session;

pub use error::{AssistantError, Result};
pub use generator::{GenerationRequest, Generator, InlineImage};
pub use session::{Message, Role, Transcript};
