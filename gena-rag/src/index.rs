//! Durable append-only vector index with exact cosine top-k search.
//!
//! Entries are kept in insertion order in memory and persisted as a single
//! JSON file written with a temp-file-then-rename replace, so a reader of
//! the store always observes a complete pre- or post-batch state. Entries
//! are never deleted; the index only grows.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};

/// Persisted file format version. Bumped on incompatible layout changes.
const INDEX_FORMAT_VERSION: u32 = 1;

/// The serialized form of the store.
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    dimensions: Option<usize>,
    created_at: DateTime<Utc>,
    entries: Vec<Chunk>,
}

#[derive(Debug)]
struct IndexState {
    /// Established embedding dimensionality; `None` until the first batch.
    dimensions: Option<usize>,
    created_at: DateTime<Utc>,
    /// Entries in insertion order. Order is the search tie-break.
    entries: Vec<Chunk>,
}

/// An append-only, persisted nearest-neighbor store.
///
/// Search is an exact linear scan under cosine similarity; ties on exact
/// score break by insertion order (earlier entries rank higher), keeping
/// results deterministic. Batch inserts are atomic with respect to
/// concurrent readers and roll back fully on persistence failure.
///
/// # Example
///
/// ```rust,ignore
/// use gena_rag::VectorIndex;
///
/// let index = VectorIndex::open("kb_index.json")?;
/// index.insert_batch(chunks).await?;
/// let results = index.search(&query_embedding, 3).await?;
/// ```
#[derive(Debug)]
pub struct VectorIndex {
    path: PathBuf,
    inner: RwLock<IndexState>,
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

impl VectorIndex {
    /// Open the store at `path`, loading persisted entries if present.
    ///
    /// A missing file is not an error — it yields an empty index which is
    /// created on the first insert. An unreadable or mis-versioned file
    /// fails with [`RagError::CorruptIndex`].
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = match fs::read(&path) {
            Ok(bytes) => {
                let file: IndexFile = serde_json::from_slice(&bytes).map_err(|e| {
                    RagError::CorruptIndex {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    }
                })?;
                if file.version != INDEX_FORMAT_VERSION {
                    return Err(RagError::CorruptIndex {
                        path: path.display().to_string(),
                        message: format!(
                            "unsupported format version {} (expected {INDEX_FORMAT_VERSION})",
                            file.version
                        ),
                    });
                }
                info!(path = %path.display(), entries = file.entries.len(), "loaded index");
                IndexState {
                    dimensions: file.dimensions,
                    created_at: file.created_at,
                    entries: file.entries,
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no persisted index, starting empty");
                IndexState { dimensions: None, created_at: Utc::now(), entries: Vec::new() }
            }
            Err(e) => {
                return Err(RagError::Storage {
                    message: format!("failed to read '{}': {e}", path.display()),
                });
            }
        };

        Ok(Self { path, inner: RwLock::new(state) })
    }

    /// Cheap existence check for the persisted store, without loading it.
    pub fn exists(path: impl AsRef<Path>) -> bool {
        path.as_ref().is_file()
    }

    /// Number of entries in the index.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Whether the index has zero entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }

    /// The established embedding dimensionality, if any batch has been
    /// inserted yet.
    pub async fn dimensions(&self) -> Option<usize> {
        self.inner.read().await.dimensions
    }

    /// When the index was first created.
    pub async fn created_at(&self) -> DateTime<Utc> {
        self.inner.read().await.created_at
    }

    /// Append a batch of chunks with embeddings, atomically.
    ///
    /// All entries are validated against the index's established
    /// dimensionality before anything is mutated, then appended and
    /// persisted as one unit. On persistence failure the in-memory state
    /// rolls back to the pre-call state — a subsequent load reflects none
    /// of the batch.
    ///
    /// # Errors
    ///
    /// [`RagError::DimensionMismatch`] if any embedding's length disagrees
    /// with the established dimensionality (or with the first entry of the
    /// batch when the index is new); [`RagError::InvalidArgument`] if any
    /// entry has an empty embedding; [`RagError::Storage`] on persistence
    /// failure.
    pub async fn insert_batch(&self, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let mut state = self.inner.write().await;

        // Validate the whole batch before touching anything.
        let expected = state.dimensions.unwrap_or(chunks[0].embedding.len());
        for chunk in &chunks {
            if chunk.embedding.is_empty() {
                return Err(RagError::InvalidArgument(format!(
                    "chunk '{}' has no embedding",
                    chunk.id
                )));
            }
            if chunk.embedding.len() != expected {
                return Err(RagError::DimensionMismatch {
                    expected,
                    actual: chunk.embedding.len(),
                });
            }
        }

        let prev_len = state.entries.len();
        let prev_dimensions = state.dimensions;
        let count = chunks.len();

        state.entries.extend(chunks);
        state.dimensions = Some(expected);

        if let Err(e) = self.persist_locked(&state) {
            // No partial commit: roll back to the pre-call state.
            state.entries.truncate(prev_len);
            state.dimensions = prev_dimensions;
            warn!(error = %e, "insert batch rolled back after storage failure");
            return Err(e);
        }

        info!(count, total = state.entries.len(), "inserted batch");
        Ok(count)
    }

    /// Return the top `k` entries by descending cosine similarity.
    ///
    /// Exact score ties rank earlier-inserted chunks higher. If the index
    /// holds fewer than `k` entries, all of them are returned.
    ///
    /// # Errors
    ///
    /// [`RagError::EmptyIndex`] if the index has zero entries;
    /// [`RagError::InvalidArgument`] if `k` is zero;
    /// [`RagError::DimensionMismatch`] if the query's length disagrees
    /// with the established dimensionality.
    pub async fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be greater than zero".into()));
        }

        let state = self.inner.read().await;
        if state.entries.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if let Some(expected) = state.dimensions {
            if query.len() != expected {
                return Err(RagError::DimensionMismatch { expected, actual: query.len() });
            }
        }

        let mut scored: Vec<SearchResult> = state
            .entries
            .iter()
            .map(|chunk| SearchResult {
                chunk: chunk.clone(),
                score: cosine_similarity(&chunk.embedding, query),
            })
            .collect();

        // Stable sort keeps insertion order on exact ties.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        debug!(k, returned = scored.len(), "search completed");
        Ok(scored)
    }

    /// Write the current state to durable storage.
    ///
    /// Normally unnecessary — [`insert_batch`](Self::insert_batch)
    /// persists on every call — but callers can force a rewrite.
    pub async fn persist(&self) -> Result<()> {
        let state = self.inner.read().await;
        self.persist_locked(&state)
    }

    /// Serialize `state` and replace the store file atomically via a
    /// temp-file-then-rename in the same directory.
    fn persist_locked(&self, state: &IndexState) -> Result<()> {
        let file = IndexFile {
            version: INDEX_FORMAT_VERSION,
            dimensions: state.dimensions,
            created_at: state.created_at,
            entries: state.entries.clone(),
        };
        let bytes = serde_json::to_vec(&file).map_err(|e| RagError::Storage {
            message: format!("failed to serialize index: {e}"),
        })?;

        let tmp_path = self.path.with_extension("tmp");
        let write_result = (|| -> std::io::Result<()> {
            let mut tmp = fs::File::create(&tmp_path)?;
            tmp.write_all(&bytes)?;
            tmp.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        })();

        write_result.map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            RagError::Storage {
                message: format!("failed to persist index to '{}': {e}", self.path.display()),
            }
        })
    }
}
