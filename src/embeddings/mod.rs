// Embeddings module
// Defines the embedding capability boundary and the Ollama-backed client

pub mod ollama;

use crate::Result;

pub use ollama::{ModelInfo, OllamaClient};

/// Batch text-to-vector embedding capability.
///
/// Implementations must return one vector per input text, in input order,
/// with a uniform dimension for the lifetime of the implementor. The
/// function is treated as pure: identical text yields identical vectors.
pub trait Embedder: Send + Sync {
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
