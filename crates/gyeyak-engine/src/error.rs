//! Engine error taxonomy
//!
//! What is fatal and what degrades:
//! - extraction and chunking failures are fatal to the call
//! - LLM unavailability and rate limiting are fatal
//! - unusable LLM output is fatal only after the repair ladder gives up
//! - vector store failures are fatal on ingestion, degraded to empty
//!   results on retrieval (those never reach this enum)

use gyeyak_extract::{ChunkError, ExtractError};
use gyeyak_llm::LlmError;
use thiserror::Error;

/// Errors surfaced by the analysis engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// No text could be recovered from the upload
    #[error(transparent)]
    Extraction(#[from] ExtractError),

    /// The extracted text could not be chunked
    #[error(transparent)]
    Chunking(#[from] ChunkError),

    /// The LLM backend is unreachable or timed out
    #[error("LLM unavailable: {0}")]
    LlmUnavailable(String),

    /// The LLM backend rate-limited us
    #[error("LLM rate limited")]
    LlmRateLimited,

    /// The LLM reply survived no rung of the repair ladder
    #[error("LLM output unusable: {0}")]
    InvalidOutput(String),

    /// A vector store write failed
    #[error("Ingestion failed: {0}")]
    Ingestion(String),

    /// The vector store was not ready at startup
    #[error("Vector store not ready: {0}")]
    StoreUnavailable(String),

    /// The embedding backend failed on a required path
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// A worker task died
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<LlmError> for EngineError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::RateLimited => EngineError::LlmRateLimited,
            LlmError::Unavailable(reason) => EngineError::LlmUnavailable(reason),
            LlmError::ModelNotAvailable(model) => {
                EngineError::LlmUnavailable(format!("model not available: {}", model))
            }
            LlmError::InvalidResponse(reason) => EngineError::LlmUnavailable(reason),
        }
    }
}
