//! Text recovery and article-aware chunking for Korean contracts
//!
//! Two stages live here:
//!
//! 1. **Extraction** — recover plain text from PDF / HWPX / HTML / TXT
//!    uploads through a fallback ladder, ending (for PDFs) at an
//!    optional pluggable OCR engine.
//! 2. **Chunking** — split the recovered text along "제N조" article
//!    headings, then length-window inside each article so retrieval
//!    citations stay aligned with the articles they cite.

#![warn(clippy::all)]

pub mod chunker;
mod clean;
pub mod error;
pub mod extractor;
mod hwpx;
mod markup;
mod pdf;

pub use chunker::ArticleChunker;
pub use clean::clean_text;
pub use error::{ChunkError, ExtractError};
pub use extractor::{Extraction, ExtractionMethod, FileFormat, OcrEngine, TextExtractor};
