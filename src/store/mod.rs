
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

use crate::chunker::{ChunkingConfig, chunk_text};
use crate::embeddings::Embedder;
use crate::extract::TextExtractor;
use crate::index::FlatIndex;
use crate::{RagError, Result};

/// A retrieved chunk together with its squared-L2 distance from the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub text: String,
    pub distance: f32,
}

/// In-memory document knowledge base: chunker + embedder + vector index.
///
/// The chunk sequence and the vector index are two views of one logical
/// sequence, correlated purely by position. A single lock guards both, so
/// the paired append is atomic and readers never observe a vector without
/// its chunk. One store instance per session; nothing is persisted.
pub struct RetrievalStore {
    embedder: Arc<dyn Embedder>,
    chunking: ChunkingConfig,
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    chunks: Vec<String>,
    index: FlatIndex,
}

impl RetrievalStore {
    #[inline]
    pub fn new(embedder: Arc<dyn Embedder>, chunking: ChunkingConfig) -> Self {
        Self {
            embedder,
            chunking,
            inner: RwLock::new(StoreInner::default()),
        }
    }

    /// Chunk `text`, embed the chunks, and append both the vectors and the
    /// chunk texts to the store as one atomic step.
    ///
    /// All-or-nothing: if chunking, embedding, or insertion fails, the store
    /// is left exactly as it was. Returns the number of chunks added, which
    /// is zero for empty input.
    #[inline]
    pub fn add_text(&self, text: &str) -> Result<usize> {
        let chunks = chunk_text(text, &self.chunking)?;
        if chunks.is_empty() {
            debug!("No chunks produced, store unchanged");
            return Ok(0);
        }

        // Embed outside the lock; only the paired append needs exclusivity
        let vectors = self.embedder.embed_batch(&chunks)?;
        if vectors.len() != chunks.len() {
            return Err(RagError::Embedding(format!(
                "Embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let added = chunks.len();
        let mut inner = self.write_lock()?;
        // FlatIndex::insert validates the whole batch before appending, so a
        // dimension mismatch here leaves both sides untouched
        inner.index.insert(vectors)?;
        inner.chunks.extend(chunks);

        info!(
            "Added {} chunks (store now holds {})",
            added,
            inner.chunks.len()
        );
        Ok(added)
    }

    /// Extract plain text from a document and ingest it via [`add_text`].
    ///
    /// Extraction failures propagate without mutating the store.
    ///
    /// [`add_text`]: RetrievalStore::add_text
    #[inline]
    pub fn add_document(&self, path: &Path, extractor: &dyn TextExtractor) -> Result<usize> {
        let text = extractor.extract(path)?;
        debug!(
            "Extracted {} characters from {}",
            text.len(),
            path.display()
        );
        self.add_text(&text)
    }

    /// Return the `top_k` chunks nearest to `question`, ordered by ascending
    /// squared-L2 distance.
    ///
    /// Querying an empty store is not an error and returns an empty result
    /// without calling the embedder.
    #[inline]
    pub fn query(&self, question: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        if self.read_lock()?.index.is_empty() {
            debug!("Query against empty store, returning no results");
            return Ok(Vec::new());
        }

        let mut vectors = self.embedder.embed_batch(&[question.to_string()])?;
        let query_vector = match vectors.pop() {
            Some(v) if vectors.is_empty() => v,
            _ => {
                return Err(RagError::Embedding(
                    "Embedder did not return exactly one vector for the query".to_string(),
                ));
            }
        };

        // One read lock across search and text lookup keeps the snapshot
        // consistent; positions from the index are valid into `chunks`
        let inner = self.read_lock()?;
        let hits = inner.index.search(&query_vector, top_k)?;

        let results = hits
            .into_iter()
            .map(|(position, distance)| ScoredChunk {
                text: inner.chunks[position].clone(),
                distance,
            })
            .collect();

        Ok(results)
    }

    /// Discard all chunks and vectors, returning to the pre-ingestion state
    /// with the embedding dimension unset.
    #[inline]
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.write_lock()?;
        inner.chunks.clear();
        inner.index.clear();
        info!("Store reset to empty");
        Ok(())
    }

    /// Number of chunks currently held, for display purposes
    #[inline]
    pub fn chunk_count(&self) -> Result<usize> {
        Ok(self.read_lock()?.chunks.len())
    }

    #[inline]
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read_lock()?.chunks.is_empty())
    }

    /// Embedding dimension fixed by the first ingestion, if any
    #[inline]
    pub fn dimension(&self) -> Result<Option<usize>> {
        Ok(self.read_lock()?.index.dimension())
    }

    fn read_lock(&self) -> Result<std::sync::RwLockReadGuard<'_, StoreInner>> {
        self.inner
            .read()
            .map_err(|_| RagError::Other(anyhow::anyhow!("store lock poisoned")))
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, StoreInner>> {
        self.inner
            .write()
            .map_err(|_| RagError::Other(anyhow::anyhow!("store lock poisoned")))
    }
}
