//! Retrieval orchestration
//!
//! Assembles grounded context from two sources — the uploaded
//! contract's own chunks and the external legal corpus — under the
//! similarity threshold gate and the source-type diversity quota.
//! Retrieval is best-effort throughout: store failures and timeouts are
//! logged and come back as empty results, never as errors.

use gyeyak_domain::{
    truncate_chars, DocumentId, EngineConfig, GroundingChunk, Issue, IssueCategory, SourceType,
};
use gyeyak_store::{ContractHit, EmbeddingCache, LegalHit, VectorStore, DEFAULT_BOOST_FACTOR};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Contract text window used when building a document-level query
const QUERY_TEXT_CHARS: usize = 2000;
/// Clause and rationale windows used when building an issue query
const QUERY_ISSUE_CHARS: usize = 500;

/// Dual-source retrieval front-end over the embedding cache and the
/// vector store gateway
pub struct Retriever {
    cache: Arc<EmbeddingCache>,
    store: Arc<dyn VectorStore>,
    config: EngineConfig,
}

impl Retriever {
    /// Wire a retriever over shared components
    pub fn new(
        cache: Arc<EmbeddingCache>,
        store: Arc<dyn VectorStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            cache,
            store,
            config,
        }
    }

    /// Embed a query, degrading to `None` on backend failure
    pub async fn embed_query(&self, query: &str) -> Option<Vec<f32>> {
        match self.cache.embed_one(query).await {
            Ok(embedding) => Some(embedding),
            Err(e) => {
                warn!(error = %e, "Query embedding failed, retrieval degraded");
                None
            }
        }
    }

    /// Search the legal corpus. With `ensure_diversity`, a candidate
    /// pool is fetched and re-selected so that at least one statute,
    /// one of {manual, standard contract}, and one case are represented
    /// when present.
    pub async fn search_legal(
        &self,
        query: &str,
        k: usize,
        category: Option<&IssueCategory>,
        ensure_diversity: bool,
    ) -> Vec<GroundingChunk> {
        let Some(embedding) = self.embed_query(query).await else {
            return Vec::new();
        };
        let mut filters = HashMap::new();
        if let Some(category) = category {
            filters.insert("topic_main".to_string(), category.as_str().to_string());
        }
        self.search_legal_with_embedding(&embedding, k, &filters, ensure_diversity)
            .await
    }

    /// Legal search with a pre-computed embedding, so callers fanning
    /// out to multiple searches embed the query once.
    pub async fn search_legal_with_embedding(
        &self,
        embedding: &[f32],
        k: usize,
        filters: &HashMap<String, String>,
        ensure_diversity: bool,
    ) -> Vec<GroundingChunk> {
        let candidate_k = if ensure_diversity {
            self.config.candidate_k.max(k)
        } else {
            k
        };

        let hits = match timeout(
            self.config.vector_timeout(),
            self.store.search_legal(embedding, candidate_k, filters),
        )
        .await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                warn!(error = %e, "Legal search failed, returning empty context");
                return Vec::new();
            }
            Err(_) => {
                warn!("Legal search timed out, returning empty context");
                return Vec::new();
            }
        };

        // Threshold gate: low-confidence context is worse than none
        let top_score = hits.first().map(|h| h.score).unwrap_or(0.0);
        if top_score < self.config.similarity_threshold {
            info!(
                top_score,
                threshold = self.config.similarity_threshold,
                "Top candidate under threshold, discarding retrieval"
            );
            return Vec::new();
        }

        let selected = if ensure_diversity {
            select_diverse(&hits, k)
        } else {
            hits.iter().take(k).collect()
        };
        debug!(candidates = hits.len(), selected = selected.len(), "Legal search complete");
        selected
            .into_iter()
            .map(|hit| GroundingChunk::from_legal(&hit.chunk, hit.score))
            .collect()
    }

    /// Search within one document's chunks. When `boost_issue` points
    /// at a numbered article, matching chunks get the article boost.
    pub async fn search_contract(
        &self,
        document_id: DocumentId,
        query: &str,
        k: usize,
        boost_issue: Option<&Issue>,
    ) -> Vec<ContractHit> {
        let Some(embedding) = self.embed_query(query).await else {
            return Vec::new();
        };
        let boost_article = boost_issue.and_then(issue_boost_article);

        match timeout(
            self.config.vector_timeout(),
            self.store.search_contract(
                document_id,
                &embedding,
                k,
                boost_article,
                DEFAULT_BOOST_FACTOR,
            ),
        )
        .await
        {
            Ok(Ok(hits)) => hits,
            Ok(Err(e)) => {
                warn!(error = %e, document_id = %document_id, "Contract search failed");
                Vec::new()
            }
            Err(_) => {
                warn!(document_id = %document_id, "Contract search timed out");
                Vec::new()
            }
        }
    }

    /// Build the document-level retrieval query: the user's description
    /// first, then the opening window of the contract text.
    pub fn build_contract_query(text: &str, description: Option<&str>) -> String {
        let window = truncate_chars(text, QUERY_TEXT_CHARS);
        match description {
            Some(description) if !description.trim().is_empty() => {
                format!("{}\n{}", description.trim(), window)
            }
            _ => window,
        }
    }

    /// Build an issue-scoped query from the clause text, the model's
    /// rationale, and the category tag.
    pub fn build_issue_query(issue: &Issue) -> String {
        let mut parts = Vec::new();
        if let Some(original) = issue.original_text.as_deref() {
            if !original.trim().is_empty() {
                parts.push(truncate_chars(original, QUERY_ISSUE_CHARS));
            }
        }
        if !issue.reason.trim().is_empty() {
            parts.push(truncate_chars(&issue.reason, QUERY_ISSUE_CHARS));
        }
        parts.push(issue.category.as_str().to_string());
        parts.join("\n")
    }
}

/// Parse the article number out of a clause id like `article-7`
fn issue_boost_article(issue: &Issue) -> Option<u32> {
    issue
        .clause_id
        .as_deref()?
        .strip_prefix("article-")?
        .parse()
        .ok()
}

/// Diversity quota over similarity-ordered candidates: pick one statute
/// if present, one of {manual, standard contract} if present, one case
/// if present, then fill by similarity order. The picked set keeps the
/// original (similarity) order.
fn select_diverse(hits: &[LegalHit], k: usize) -> Vec<&LegalHit> {
    let mut picked: HashSet<usize> = HashSet::new();

    let pick_first = |wanted: &[SourceType], picked: &mut HashSet<usize>| {
        if let Some(index) = hits
            .iter()
            .position(|hit| wanted.contains(&hit.chunk.source_type))
        {
            picked.insert(index);
        }
    };
    pick_first(&[SourceType::Law], &mut picked);
    pick_first(
        &[SourceType::Manual, SourceType::StandardContract],
        &mut picked,
    );
    pick_first(&[SourceType::Case], &mut picked);

    // Fill the remaining slots by similarity
    for index in 0..hits.len() {
        if picked.len() >= k {
            break;
        }
        picked.insert(index);
    }

    // Re-sort the selection by similarity (original order)
    let mut indices: Vec<usize> = picked.into_iter().collect();
    indices.sort_unstable();
    indices.truncate(k);
    indices.into_iter().map(|i| &hits[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyeyak_domain::LegalChunk;

    fn hit(source_type: SourceType, score: f32, id: &str) -> LegalHit {
        LegalHit {
            chunk: LegalChunk {
                external_id: id.to_string(),
                chunk_index: 0,
                source_type,
                title: id.to_string(),
                content: "내용".to_string(),
                file_path: None,
                metadata: HashMap::new(),
            },
            score,
        }
    }

    #[test]
    fn diversity_includes_each_family_when_present() {
        // Pure top-3 would be all statutes
        let hits = vec![
            hit(SourceType::Law, 0.9, "law-1"),
            hit(SourceType::Law, 0.88, "law-2"),
            hit(SourceType::Law, 0.86, "law-3"),
            hit(SourceType::StandardContract, 0.7, "std-1"),
            hit(SourceType::Case, 0.6, "case-1"),
        ];
        let selected = select_diverse(&hits, 3);
        let types: Vec<SourceType> = selected.iter().map(|h| h.chunk.source_type).collect();
        assert!(types.contains(&SourceType::Law));
        assert!(types.contains(&SourceType::StandardContract));
        assert!(types.contains(&SourceType::Case));
    }

    #[test]
    fn diversity_selection_stays_similarity_ordered() {
        let hits = vec![
            hit(SourceType::Law, 0.9, "law-1"),
            hit(SourceType::Manual, 0.8, "manual-1"),
            hit(SourceType::Case, 0.5, "case-1"),
        ];
        let selected = select_diverse(&hits, 3);
        let scores: Vec<f32> = selected.iter().map(|h| h.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn diversity_fills_remaining_slots_by_similarity() {
        let hits = vec![
            hit(SourceType::Law, 0.9, "law-1"),
            hit(SourceType::Law, 0.85, "law-2"),
            hit(SourceType::Manual, 0.8, "manual-1"),
            hit(SourceType::Manual, 0.75, "manual-2"),
        ];
        let selected = select_diverse(&hits, 3);
        let ids: Vec<&str> = selected.iter().map(|h| h.chunk.external_id.as_str()).collect();
        assert_eq!(ids, vec!["law-1", "law-2", "manual-1"]);
    }

    #[test]
    fn single_source_corpus_still_fills_k() {
        let hits = vec![
            hit(SourceType::Law, 0.9, "law-1"),
            hit(SourceType::Law, 0.8, "law-2"),
        ];
        let selected = select_diverse(&hits, 4);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn contract_query_puts_description_first() {
        let query = Retriever::build_contract_query("계약 본문", Some("야근이 잦습니다"));
        assert!(query.starts_with("야근이 잦습니다"));
        assert!(query.contains("계약 본문"));
    }

    #[test]
    fn contract_query_window_is_bounded() {
        let text = "가".repeat(5000);
        let query = Retriever::build_contract_query(&text, None);
        assert_eq!(query.chars().count(), QUERY_TEXT_CHARS);
    }

    #[test]
    fn issue_query_carries_clause_reason_and_category() {
        let mut issue = Issue::new(
            "i1",
            IssueCategory::Wage,
            gyeyak_domain::Severity::High,
            "수당 포기",
            "법정 수당은 포기할 수 없습니다",
        );
        issue.original_text = Some("추가 수당을 청구하지 않기로 합의한다".to_string());
        let query = Retriever::build_issue_query(&issue);
        assert!(query.contains("추가 수당을"));
        assert!(query.contains("포기할 수 없습니다"));
        assert!(query.ends_with("wage"));
    }

    #[test]
    fn boost_article_parses_clause_id() {
        let mut issue = Issue::new(
            "i1",
            IssueCategory::WorkingHours,
            gyeyak_domain::Severity::Low,
            "s",
            "r",
        );
        assert_eq!(issue_boost_article(&issue), None);
        issue.clause_id = Some("article-7".to_string());
        assert_eq!(issue_boost_article(&issue), Some(7));
        issue.clause_id = Some("preamble".to_string());
        assert_eq!(issue_boost_article(&issue), None);
    }
}
