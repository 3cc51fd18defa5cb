//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`FixedSizeChunker`],
//! which splits by character count with configurable overlap and prefers
//! natural boundaries (paragraph, sentence, word) within a small lookback
//! window over hard mid-word cuts.

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and a source offset but no
/// embeddings. Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    /// Each returned chunk has an empty embedding vector.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text into fixed-size chunks by character count with overlap.
///
/// Consecutive windows of `chunk_size` characters advance by
/// `chunk_size - chunk_overlap` each step; the final chunk may be shorter.
/// A window end is snapped back to the nearest paragraph, sentence, or
/// word boundary within a small lookback window; if none is found the cut
/// is hard at `chunk_size` characters. Snapping never shortens a window
/// past the overlap, so consecutive chunks always advance.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`.
///
/// # Example
///
/// ```rust,ignore
/// use gena_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::try_new(1000, 100)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

/// Boundary separators in preference order: paragraph, sentence, word.
const SEPARATOR_TIERS: [&[&str]; 3] = [&["\n\n"], &[". ", "! ", "? "], &[" "]];

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`, validating its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn try_new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::InvalidArgument("chunk_size must be greater than zero".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::InvalidArgument(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// How far back from the hard cut a natural boundary may be.
    fn lookback(&self) -> usize {
        (self.chunk_size / 4).clamp(8, 64)
    }

    /// Snap a window end back to the latest natural boundary inside the
    /// lookback window, in characters. Falls back to `hard_end`.
    fn snap_end(
        &self,
        text: &str,
        boundaries: &[usize],
        start: usize,
        hard_end: usize,
    ) -> usize {
        // The snapped end must stay past the overlap so the next window
        // advances, and inside the lookback window.
        let min_end = hard_end
            .saturating_sub(self.lookback())
            .max(start + self.chunk_overlap + 1);
        if min_end >= hard_end {
            return hard_end;
        }

        let window = &text[boundaries[min_end]..boundaries[hard_end]];
        for tier in SEPARATOR_TIERS {
            let mut best: Option<usize> = None;
            for sep in tier {
                if let Some(pos) = window.rfind(sep) {
                    let candidate = pos + sep.len();
                    best = Some(best.map_or(candidate, |b: usize| b.max(candidate)));
                }
            }
            if let Some(end_byte) = best {
                let abs_byte = boundaries[min_end] + end_byte;
                // Separator ends are char boundaries, so this finds the
                // exact char index of the cut.
                let end_char = boundaries.partition_point(|&b| b < abs_byte);
                if end_char > start + self.chunk_overlap && end_char <= hard_end {
                    return end_char;
                }
            }
        }

        hard_end
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let text = &document.text;
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, with the end as a sentinel.
        let boundaries: Vec<usize> =
            text.char_indices().map(|(i, _)| i).chain([text.len()]).collect();
        let total_chars = boundaries.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut chunk_index = 0;

        while start < total_chars {
            let hard_end = (start + self.chunk_size).min(total_chars);
            let end = if hard_end == total_chars {
                total_chars
            } else {
                self.snap_end(text, &boundaries, start, hard_end)
            };

            chunks.push(Chunk {
                id: format!("{}_{chunk_index}", document.id),
                text: text[boundaries[start]..boundaries[end]].to_string(),
                source_offset: boundaries[start],
                embedding: Vec::new(),
                document_id: document.id.clone(),
            });

            chunk_index += 1;
            if end == total_chars {
                break;
            }
            start = end - self.chunk_overlap;
        }

        chunks
    }
}
