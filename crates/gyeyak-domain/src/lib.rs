//! Gyeyak Domain Layer
//!
//! Core types for the contract risk analysis engine. This crate defines
//! the vocabulary every other layer speaks:
//!
//! - **Document / ContractChunk**: an uploaded contract and its
//!   article-aligned segments
//! - **LegalChunk / GroundingChunk**: corpus units and the retrieval
//!   projection attached to LLM output as evidence
//! - **Issue**: a single categorized, grounded risk finding
//! - **AnalysisReport / DiagnosisReport**: root outputs with stable
//!   JSON shapes
//! - **EngineConfig**: tuning knobs shared across the pipeline
//!
//! Infrastructure (vector store, LLM client, extraction) lives in the
//! sibling crates; this one stays free of I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod category;
pub mod config;
pub mod document;
pub mod issue;
pub mod report;
pub mod risk;
pub mod source;

// Re-exports for convenience
pub use category::IssueCategory;
pub use config::EngineConfig;
pub use document::{
    truncate_chars, ContractChunk, Document, DocumentId, GroundingChunk, LegalChunk,
};
pub use issue::{Issue, LegalBasis, Recommendation};
pub use report::{
    AnalysisReport, Clause, DiagnosisReport, HighlightedText, SectionScores, SituationRequest,
};
pub use risk::{RiskLevel, Severity};
pub use source::{GroundingStatus, SourceType};
