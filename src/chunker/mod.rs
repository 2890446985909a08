
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{RagError, Result};

/// Configuration for splitting raw text into overlapping word windows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in words
    pub chunk_size: usize,
    /// Number of trailing words repeated at the start of the next window
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 100,
        }
    }
}

impl ChunkingConfig {
    /// Validate the chunking parameters.
    ///
    /// The stride between windows is `chunk_size - overlap`, so the overlap
    /// must be strictly smaller than the chunk size or chunking would never
    /// advance.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config(
                "chunk_size must be at least 1 word".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

/// Split `text` into overlapping windows of whitespace-separated words.
///
/// Each window holds up to `chunk_size` words re-joined with single spaces.
/// Successive windows start `chunk_size - overlap` words after the previous
/// one, so the last `overlap` words of a window recur verbatim at the start
/// of the next. The final window may be shorter than `chunk_size`.
///
/// Empty input yields no chunks; a chunk is never empty otherwise.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    config.validate()?;

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let stride = config.chunk_size - config.overlap;
    let mut chunks = Vec::with_capacity(words.len().div_ceil(stride));
    let mut start = 0;

    while start < words.len() {
        let end = (start + config.chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        start += stride;
    }

    debug!(
        "Chunked {} words into {} chunks (chunk_size: {}, overlap: {})",
        words.len(),
        chunks.len(),
        config.chunk_size,
        config.overlap
    );

    Ok(chunks)
}
