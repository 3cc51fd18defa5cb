//! Bounded context assembly from retrieval results.

use crate::document::SearchResult;

/// Default delimiter placed between retrieved chunks.
const DEFAULT_DELIMITER: &str = "\n\n";

/// Joins retrieved chunk texts into a single bounded context string.
///
/// Chunks are concatenated in result order (descending score) separated
/// by a fixed delimiter. The final included chunk is truncated at the
/// remaining character capacity; once capacity is exhausted, remaining
/// chunks are dropped whole. An empty result assembles to an empty
/// string, which the caller must treat as a distinct "no context"
/// generation path.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    max_context_chars: usize,
    delimiter: String,
}

impl ContextAssembler {
    /// Create an assembler with the given character budget.
    pub fn new(max_context_chars: usize) -> Self {
        Self { max_context_chars, delimiter: DEFAULT_DELIMITER.to_string() }
    }

    /// Override the delimiter placed between chunks.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Concatenate chunk texts in result order within the budget.
    pub fn assemble(&self, results: &[SearchResult]) -> String {
        let delimiter_chars = self.delimiter.chars().count();
        let mut out = String::new();
        let mut remaining = self.max_context_chars;

        for result in results {
            if !out.is_empty() {
                // The delimiter only earns its space if at least one more
                // character of chunk text fits after it.
                if remaining <= delimiter_chars {
                    break;
                }
                out.push_str(&self.delimiter);
                remaining -= delimiter_chars;
            }

            let text = &result.chunk.text;
            let take = text.chars().count().min(remaining);
            if take == 0 {
                break;
            }
            out.extend(text.chars().take(take));
            remaining -= take;

            if remaining == 0 {
                break;
            }
        }

        out
    }
}
