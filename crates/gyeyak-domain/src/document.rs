//! Documents, chunks, and the retrieval projection

use crate::source::SourceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Maximum snippet length carried by a grounding chunk
pub const SNIPPET_CHARS: usize = 300;

/// Unique identifier for an uploaded contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentId(uuid::Uuid);

impl DocumentId {
    /// Generate a fresh id
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Parse from the canonical hyphenated form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| format!("Invalid document id: {}", e))
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> uuid::Uuid {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An uploaded contract. Created on upload, never mutated; owns its
/// contract chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier
    pub id: DocumentId,
    /// Display title (typically the file name)
    pub title: String,
    /// MIME hint from the upload, when known
    pub mime_hint: Option<String>,
    /// Full extracted text
    pub text: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Create a new document with a fresh id
    pub fn new(title: impl Into<String>, mime_hint: Option<String>, text: impl Into<String>) -> Self {
        Self {
            id: DocumentId::new(),
            title: title.into(),
            mime_hint,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// One segment of a contract, aligned to a "제N조" article where the
/// heading could be detected.
///
/// Within a document, `chunk_index` is dense and contiguous from 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractChunk {
    /// Owning document
    pub document_id: DocumentId,
    /// Article number from the heading, when detected
    pub article_number: Option<u32>,
    /// Position of this chunk within its article
    pub paragraph_index: Option<u32>,
    /// Segment text
    pub content: String,
    /// Dense index within the document
    pub chunk_index: usize,
    /// Free-form metadata inherited from the caller
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// A unit of the external legal corpus.
///
/// `(external_id, chunk_index)` is unique; re-ingesting a file with the
/// same `external_id` is a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalChunk {
    /// Deterministic id derived from the source file path
    pub external_id: String,
    /// Index of this chunk within its source file
    pub chunk_index: usize,
    /// Corpus family this chunk belongs to
    pub source_type: SourceType,
    /// Source title (statute name, manual title, ...)
    pub title: String,
    /// Chunk text
    pub content: String,
    /// Path of the ingested source file, when known
    pub file_path: Option<String>,
    /// Topic tags and article references (`topic_main`, `article`, ...)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl LegalChunk {
    /// Deterministic external id for a source file path
    pub fn external_id_for_path(path: &str) -> String {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }
}

/// A legal chunk projected into retrieval output: a value copied out of
/// the corpus, attached to LLM output as evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingChunk {
    /// `external_id` of the source chunk
    pub source_id: String,
    /// Corpus family
    pub source_type: SourceType,
    /// Source title
    pub title: String,
    /// Content truncated to 300 chars
    pub snippet: String,
    /// Cosine similarity in [0, 1]
    pub score: f32,
    /// Source file path, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl GroundingChunk {
    /// Project a legal chunk and its similarity score
    pub fn from_legal(chunk: &LegalChunk, score: f32) -> Self {
        Self {
            source_id: chunk.external_id.clone(),
            source_type: chunk.source_type,
            title: chunk.title.clone(),
            snippet: truncate_chars(&chunk.content, SNIPPET_CHARS),
            score,
            file_path: chunk.file_path.clone(),
        }
    }
}

/// Truncate to at most `max` chars without splitting a UTF-8 boundary
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_round_trip() {
        let id = DocumentId::new();
        let parsed = DocumentId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_document_ids_are_fresh() {
        assert_ne!(DocumentId::new(), DocumentId::new());
    }

    #[test]
    fn test_external_id_deterministic() {
        let a = LegalChunk::external_id_for_path("corpus/labor_standards.txt");
        let b = LegalChunk::external_id_for_path("corpus/labor_standards.txt");
        let c = LegalChunk::external_id_for_path("corpus/minimum_wage.txt");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_truncate_chars_korean() {
        let s = "근로기준법 제56조에 따른 연장근로 수당";
        let t = truncate_chars(s, 5);
        assert_eq!(t, "근로기준법");
        // Shorter than the limit comes back unchanged
        assert_eq!(truncate_chars(s, 1000), s);
    }

    #[test]
    fn test_grounding_snippet_bounded() {
        let chunk = LegalChunk {
            external_id: "abc".to_string(),
            chunk_index: 0,
            source_type: SourceType::Law,
            title: "근로기준법".to_string(),
            content: "가".repeat(500),
            file_path: None,
            metadata: HashMap::new(),
        };
        let grounding = GroundingChunk::from_legal(&chunk, 0.9);
        assert_eq!(grounding.snippet.chars().count(), SNIPPET_CHARS);
        assert_eq!(grounding.source_id, "abc");
    }
}
