use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding service error: {0}")]
    Embedding(String),

    #[error("Chat service error: {0}")]
    Chat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chat;
pub mod chunker;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod extract;
pub mod index;
pub mod store;
