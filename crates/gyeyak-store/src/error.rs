//! Error types for the storage layer

use thiserror::Error;

/// Errors from vector store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or answered abnormally.
    /// Non-fatal on retrieval (callers degrade to an empty result),
    /// fatal on ingestion.
    #[error("Vector store unavailable: {0}")]
    Unavailable(String),

    /// An ingestion write failed
    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    /// A required collection is missing and could not be created
    #[error("Collection missing: {0}")]
    MissingCollection(String),

    /// The store answered with something we could not decode
    #[error("Invalid store response: {0}")]
    InvalidResponse(String),
}

/// Errors from embedding backends
#[derive(Error, Debug)]
pub enum EmbedError {
    /// Input the backend cannot embed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The backend failed or answered abnormally
    #[error("Embedding backend error: {0}")]
    Backend(String),
}
