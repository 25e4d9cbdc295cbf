//! Vector store gateway contract
//!
//! A thin contract over an external k-nearest cosine index exposing the
//! `legal-chunks`, `contract-chunks`, and `team-embeddings` collections.
//! The engine never talks to a store directly; it goes through this
//! trait so tests can swap the in-memory scan for the remote client.

use crate::error::StoreError;
use async_trait::async_trait;
use gyeyak_domain::{ContractChunk, DocumentId, LegalChunk, SourceType};
use std::collections::HashMap;

/// Default multiplier applied to rows matching `boost_article`
pub const DEFAULT_BOOST_FACTOR: f32 = 1.5;

/// A legal chunk ready for ingestion
#[derive(Debug, Clone)]
pub struct LegalPoint {
    /// Corpus chunk
    pub chunk: LegalChunk,
    /// Its embedding
    pub embedding: Vec<f32>,
}

/// A contract chunk ready for ingestion
#[derive(Debug, Clone)]
pub struct ContractPoint {
    /// Document chunk
    pub chunk: ContractChunk,
    /// Its embedding
    pub embedding: Vec<f32>,
}

/// A legal search result row
#[derive(Debug, Clone)]
pub struct LegalHit {
    /// Matched chunk
    pub chunk: LegalChunk,
    /// Similarity (boosted where applicable), descending order
    pub score: f32,
}

/// A contract search result row
#[derive(Debug, Clone)]
pub struct ContractHit {
    /// Matched chunk
    pub chunk: ContractChunk,
    /// Similarity (boosted where applicable), descending order
    pub score: f32,
}

/// Contract over the external vector index.
///
/// Filter semantics: a flat `key → value` map matched by equality
/// against the chunk's metadata; the reserved keys `source_type` and
/// `topic_main` match the chunk's source type and topic tag. Unknown
/// keys match nothing.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collections if missing. A failure here is fatal at
    /// startup, never deferred to query time.
    async fn ensure_collections(&self) -> Result<(), StoreError>;

    /// Ingest legal corpus chunks. Idempotent on `external_id`:
    /// re-ingesting a file already present is a no-op. Returns the
    /// number of points accepted as new.
    async fn upsert_legal(&self, points: Vec<LegalPoint>) -> Result<usize, StoreError>;

    /// Replace a document's chunks atomically (delete-then-insert where
    /// the store lacks transactions)
    async fn upsert_contract(
        &self,
        document_id: DocumentId,
        points: Vec<ContractPoint>,
    ) -> Result<(), StoreError>;

    /// k-nearest legal chunks by cosine similarity, descending
    async fn search_legal(
        &self,
        embedding: &[f32],
        k: usize,
        filters: &HashMap<String, String>,
    ) -> Result<Vec<LegalHit>, StoreError>;

    /// k-nearest chunks of one document, with optional article boost
    async fn search_contract(
        &self,
        document_id: DocumentId,
        embedding: &[f32],
        k: usize,
        boost_article: Option<u32>,
        boost_factor: f32,
    ) -> Result<Vec<ContractHit>, StoreError>;
}

/// Shared filter matching for legal chunks
pub(crate) fn legal_chunk_matches(chunk: &LegalChunk, filters: &HashMap<String, String>) -> bool {
    filters.iter().all(|(key, value)| match key.as_str() {
        "source_type" => value
            .parse::<SourceType>()
            .map(|st| st == chunk.source_type)
            .unwrap_or(false),
        _ => chunk.metadata.get(key) == Some(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_with(topic: &str) -> LegalChunk {
        let mut metadata = HashMap::new();
        metadata.insert("topic_main".to_string(), topic.to_string());
        LegalChunk {
            external_id: "x".to_string(),
            chunk_index: 0,
            source_type: SourceType::Law,
            title: "근로기준법".to_string(),
            content: "...".to_string(),
            file_path: None,
            metadata,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(legal_chunk_matches(&chunk_with("wage"), &HashMap::new()));
    }

    #[test]
    fn metadata_filter_is_equality() {
        let mut filters = HashMap::new();
        filters.insert("topic_main".to_string(), "wage".to_string());
        assert!(legal_chunk_matches(&chunk_with("wage"), &filters));
        assert!(!legal_chunk_matches(&chunk_with("working_hours"), &filters));
    }

    #[test]
    fn source_type_filter_uses_the_typed_field() {
        let mut filters = HashMap::new();
        filters.insert("source_type".to_string(), "law".to_string());
        assert!(legal_chunk_matches(&chunk_with("wage"), &filters));
        filters.insert("source_type".to_string(), "case".to_string());
        assert!(!legal_chunk_matches(&chunk_with("wage"), &filters));
    }

    #[test]
    fn unknown_filter_key_matches_nothing() {
        let mut filters = HashMap::new();
        filters.insert("nonexistent".to_string(), "x".to_string());
        assert!(!legal_chunk_matches(&chunk_with("wage"), &filters));
    }
}
