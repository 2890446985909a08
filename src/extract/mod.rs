
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::{RagError, Result};

/// Converts a document on disk into plain text for ingestion.
///
/// This is the seam where binary-format parsers (PDF and friends) would
/// plug in; the retrieval core never inspects document internals itself.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Extractor for UTF-8 plain-text files
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PlainTextExtractor {
    #[inline]
    fn extract(&self, path: &Path) -> Result<String> {
        debug!("Extracting text from {}", path.display());

        let bytes = fs::read(path).map_err(|e| {
            RagError::Extraction(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let text = String::from_utf8(bytes).map_err(|_| {
            RagError::Extraction(format!("{} is not valid UTF-8 text", path.display()))
        })?;

        if text.trim().is_empty() {
            return Err(RagError::Extraction(format!(
                "{} contains no extractable text",
                path.display()
            )));
        }

        Ok(text)
    }
}
