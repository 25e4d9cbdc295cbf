//! Error types for extraction and chunking

use thiserror::Error;

/// Errors that can occur while recovering text from an upload
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The file could not be read at all
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The format is not one we can extract
    #[error("Unsupported format: {0}")]
    Unsupported(String),

    /// Every method in the ladder came back empty. The per-method
    /// failure notes are preserved so the user sees why.
    #[error("No text recovered; tried: {}", .tried.join("; "))]
    Empty {
        /// One entry per attempted method, `method: reason`
        tried: Vec<String>,
    },
}

/// Errors that can occur while chunking extracted text
#[derive(Error, Debug)]
pub enum ChunkError {
    /// Input shorter than the 10-char minimum
    #[error("Text too short to chunk: {0} chars (min: 10)")]
    TooShort(usize),

    /// Cleaning emptied every chunk
    #[error("All chunks were empty after cleaning")]
    AllEmpty,
}
