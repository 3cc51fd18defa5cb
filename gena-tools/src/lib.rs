//! External collaborators for the gena assistant.
//!
//! These wrap the two retrieval sources that are not part of the RAG
//! core: a tabular medical Q&A dataset searched by keyword, and the
//! arXiv search index.

pub mod arxiv;
pub mod error;
pub mod medical;

pub use arxiv::{ArxivClient, ArxivPaper};
pub use error::{Result, ToolError};
pub use medical::MedicalDataset;
