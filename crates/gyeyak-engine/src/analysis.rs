//! Contract analysis orchestration
//!
//! The nine-phase pipeline: query build, toxic-pattern pre-scan,
//! concurrent dual retrieval, prompt assembly, LLM call, parse with
//! repair, per-issue re-retrieval, safety-net synthesis, and
//! original-text anchoring. Retrieval degrades to empty context;
//! extraction, chunking, and LLM failures are fatal.

use crate::error::EngineError;
use crate::retrieval::Retriever;
use crate::{parser, patterns, prompt, Engine};
use chrono::Utc;
use gyeyak_domain::{
    truncate_chars, AnalysisReport, Clause, ContractChunk, Document, DocumentId, HighlightedText,
    LegalBasis, RiskLevel, SectionScores,
};
use gyeyak_extract::FileFormat;
use gyeyak_llm::ChatMessage;
use gyeyak_store::ContractPoint;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{info, warn};

impl Engine {
    /// Full pipeline from an uploaded file: extract, chunk, embed,
    /// ingest, analyze. Contract-chunk ingestion failure degrades the
    /// call to legal-only retrieval instead of failing it.
    pub async fn analyze_file(
        &self,
        path: &Path,
        format_hint: Option<FileFormat>,
        description: Option<&str>,
    ) -> Result<AnalysisReport, EngineError> {
        let extractor = Arc::clone(&self.extractor);
        let owned_path = path.to_path_buf();
        let extraction =
            tokio::task::spawn_blocking(move || extractor.extract(&owned_path, format_hint))
                .await
                .map_err(|e| EngineError::Internal(format!("extraction task failed: {}", e)))??;

        let title = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("계약서")
            .to_string();
        let document = Document::new(title, None, extraction.text);
        self.analyze_document(&document, description).await
    }

    /// Analyze an already-extracted document, ingesting its chunks
    /// first so dual retrieval can see them.
    pub async fn analyze_document(
        &self,
        document: &Document,
        description: Option<&str>,
    ) -> Result<AnalysisReport, EngineError> {
        let chunks = self
            .chunker
            .chunk(document.id, &document.text, &HashMap::new())?;
        let ingested = self.ingest_contract_chunks(&chunks).await;
        if !ingested {
            warn!(document_id = %document.id, "Chunk ingestion failed, falling back to legal-only retrieval");
        }
        self.run_analysis(document, &chunks, description, ingested)
            .await
    }

    /// Analyze raw contract text. Pass `document_id` only when that
    /// document's chunks are already in the vector store; without it
    /// the call runs on legal retrieval alone.
    pub async fn analyze_contract(
        &self,
        text: &str,
        description: Option<&str>,
        document_id: Option<DocumentId>,
    ) -> Result<AnalysisReport, EngineError> {
        let mut document = Document::new("계약서", None, text);
        if let Some(id) = document_id {
            document.id = id;
        }
        let chunks = self
            .chunker
            .chunk(document.id, &document.text, &HashMap::new())?;
        self.run_analysis(&document, &chunks, description, document_id.is_some())
            .await
    }

    /// Embed and upsert a document's chunks; false means the caller
    /// should run legal-only retrieval.
    async fn ingest_contract_chunks(&self, chunks: &[ContractChunk]) -> bool {
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = match self.cache.embed_many(&texts).await {
            Ok(embeddings) => embeddings,
            Err(e) => {
                warn!(error = %e, "Chunk embedding failed");
                return false;
            }
        };
        let document_id = chunks[0].document_id;
        let points: Vec<ContractPoint> = chunks
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(chunk, embedding)| ContractPoint { chunk, embedding })
            .collect();

        match timeout(
            self.config.vector_timeout(),
            self.store.upsert_contract(document_id, points),
        )
        .await
        {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "Chunk upsert failed");
                false
            }
            Err(_) => {
                warn!("Chunk upsert timed out");
                false
            }
        }
    }

    async fn run_analysis(
        &self,
        document: &Document,
        chunks: &[ContractChunk],
        description: Option<&str>,
        use_contract_search: bool,
    ) -> Result<AnalysisReport, EngineError> {
        let text = &document.text;

        // Phase 1: document-level query
        let query = Retriever::build_contract_query(text, description);

        // Phase 2: rule-based pre-scan; the hint is additive only
        let toxic = patterns::scan(text);
        let hint = patterns::prescan_hint(&toxic);
        let effective_description = match (description, hint) {
            (Some(d), Some(h)) => Some(format!("{}\n\n{}", d, h)),
            (None, Some(h)) => Some(h),
            (Some(d), None) => Some(d.to_string()),
            (None, None) => None,
        };

        // Phase 3: dual retrieval, concurrent; either side may come
        // back empty without failing the call
        let k = self.config.vector_top_k;
        let legal_future =
            self.retriever
                .search_legal(&query, k, None, self.config.diversity_enabled);
        let contract_future = async {
            if use_contract_search {
                self.retriever
                    .search_contract(document.id, &query, k, None)
                    .await
            } else {
                Vec::new()
            }
        };
        let (legal_chunks, contract_hits) = tokio::join!(legal_future, contract_future);

        // Phases 4-5: prompt assembly and the LLM call
        let window = truncate_chars(text, self.config.max_contract_chars);
        let messages = prompt::build_analysis_prompt(
            &window,
            &contract_hits,
            &legal_chunks,
            effective_description.as_deref(),
        );
        let raw = self.complete_with_timeout(&messages).await?;

        // Phase 6: parse through the repair ladder
        let parsed = parser::parse_analysis(&raw)?;

        // Phase 7: per-issue re-retrieval, sequential and tolerant
        let mut issues = parsed.issues;
        issues.truncate(self.config.max_issues);
        for issue in issues.iter_mut() {
            let issue_query = Retriever::build_issue_query(issue);
            let grounded = self
                .retriever
                .search_legal(&issue_query, k, Some(&issue.category), false)
                .await;
            if !grounded.is_empty() {
                issue.legal_basis = grounded.into_iter().map(LegalBasis::new).collect();
            }
        }

        // Phase 8: safety net for a detected waiver the model missed
        if !toxic.is_empty() && !patterns::covers_wage_waiver(&issues) {
            let issue_id = format!("issue-{}", issues.len() + 1);
            issues.push(patterns::synthesize_wage_waiver_issue(&toxic[0], issue_id));
        }

        // Phase 9: anchor excerpts; indices are never fabricated
        let mut highlighted_texts = Vec::new();
        for issue in issues.iter_mut() {
            if let Some((start, end)) = anchor_excerpt(text, issue.original_text.as_deref()) {
                issue.start_index = Some(start);
                issue.end_index = Some(end);
                highlighted_texts.push(HighlightedText {
                    issue_id: issue.issue_id.clone(),
                    text: text[start..end].to_string(),
                    start_index: start,
                    end_index: end,
                });
            }
        }

        // Derive the level; preserve an explicit LLM override but flag it
        let derived = RiskLevel::from_score(parsed.risk_score);
        let (risk_level, level_overridden) = match parsed.risk_level {
            Some(level) if level != derived => {
                warn!(
                    risk_score = parsed.risk_score,
                    derived = %derived,
                    llm_level = %level,
                    "LLM risk level overrides the score-derived level"
                );
                (level, true)
            }
            _ => (derived, false),
        };

        let mut summary = parsed.summary;
        if legal_chunks.is_empty() {
            if !summary.is_empty() {
                summary.push(' ');
            }
            summary.push_str("(법령 근거 없음)");
        }

        info!(
            document_id = %document.id,
            risk_score = parsed.risk_score,
            issues = issues.len(),
            retrieved = legal_chunks.len(),
            "Contract analysis complete"
        );

        Ok(AnalysisReport {
            doc_id: document.id,
            title: document.title.clone(),
            risk_score: parsed.risk_score,
            risk_level,
            level_overridden,
            sections: SectionScores::from_issues(&issues),
            issues,
            summary,
            recommendations: parsed.recommendations,
            retrieved_contexts: legal_chunks,
            contract_text: document.text.clone(),
            clauses: derive_clauses(chunks),
            highlighted_texts,
            created_at: Utc::now(),
        })
    }

    /// LLM call under the configured timeout; an elapse is
    /// `LlmUnavailable`, failing the whole analysis.
    pub(crate) async fn complete_with_timeout(
        &self,
        messages: &[ChatMessage],
    ) -> Result<String, EngineError> {
        match timeout(
            self.config.llm_timeout(),
            self.llm.complete(messages, self.config.llm_temperature),
        )
        .await
        {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(EngineError::LlmUnavailable(format!(
                "timed out after {}ms",
                self.config.llm_timeout_ms
            ))),
        }
    }
}

/// Group article-aligned chunks into report clauses, preserving the
/// document's article order.
fn derive_clauses(chunks: &[ContractChunk]) -> Vec<Clause> {
    let mut order: Vec<Option<u32>> = Vec::new();
    let mut bodies: HashMap<Option<u32>, String> = HashMap::new();

    for chunk in chunks {
        let body = bodies.entry(chunk.article_number).or_insert_with(|| {
            order.push(chunk.article_number);
            String::new()
        });
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(&chunk.content);
    }

    order
        .into_iter()
        .map(|article_number| {
            let clause_id = match article_number {
                Some(n) => format!("article-{}", n),
                None => "preamble".to_string(),
            };
            Clause {
                clause_id,
                article_number,
                text: bodies.remove(&article_number).unwrap_or_default(),
            }
        })
        .collect()
}

/// Locate an excerpt in the document text: exact match first, then
/// progressively shorter prefixes expanded to the surrounding sentence.
/// Returns byte offsets, or `None` when no anchor exists.
fn anchor_excerpt(text: &str, excerpt: Option<&str>) -> Option<(usize, usize)> {
    let excerpt = excerpt?.trim();
    if excerpt.is_empty() {
        return None;
    }
    if let Some(start) = text.find(excerpt) {
        return Some((start, start + excerpt.len()));
    }

    for prefix_chars in [100usize, 50] {
        let prefix = truncate_chars(excerpt, prefix_chars);
        let prefix = prefix.trim();
        if prefix == excerpt || prefix.is_empty() {
            continue;
        }
        if let Some(start) = text.find(prefix) {
            let match_end = start + prefix.len();
            // Expand to the surrounding sentence
            let sentence_start = text[..start]
                .rfind(['.', '\n'])
                .map(|i| i + 1)
                .unwrap_or(0);
            let sentence_end = text[match_end..]
                .find(['.', '\n'])
                .map(|i| match_end + i + 1)
                .unwrap_or(text.len());
            return Some((sentence_start, sentence_end));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use gyeyak_domain::DocumentId;

    fn chunk(article: Option<u32>, index: usize, content: &str) -> ContractChunk {
        ContractChunk {
            document_id: DocumentId::new(),
            article_number: article,
            paragraph_index: Some(0),
            content: content.to_string(),
            chunk_index: index,
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn clauses_follow_article_order() {
        let chunks = vec![
            chunk(None, 0, "전문"),
            chunk(Some(1), 1, "제1조 첫째 단락"),
            chunk(Some(1), 2, "제1조 둘째 단락"),
            chunk(Some(2), 3, "제2조"),
        ];
        let clauses = derive_clauses(&chunks);
        assert_eq!(clauses.len(), 3);
        assert_eq!(clauses[0].clause_id, "preamble");
        assert_eq!(clauses[1].clause_id, "article-1");
        assert!(clauses[1].text.contains("첫째"));
        assert!(clauses[1].text.contains("둘째"));
        assert_eq!(clauses[2].article_number, Some(2));
    }

    #[test]
    fn exact_excerpt_anchors_verbatim() {
        let text = "제1조 목적. 제2조 근로시간은 주 40시간으로 한다. 제3조 임금.";
        let (start, end) = anchor_excerpt(text, Some("근로시간은 주 40시간으로 한다")).unwrap();
        assert_eq!(&text[start..end], "근로시간은 주 40시간으로 한다");
    }

    #[test]
    fn prefix_match_expands_to_the_sentence() {
        // The model quoted the clause with a paraphrased tail; only the
        // first 50+ chars exist verbatim.
        let sentence = "근로자는 연장 근로, 야간 근로 및 휴일 근로에 대하여 발생하는 일체의 추가 수당을 사업주에게 청구하지 않기로 상호 합의한다";
        let text = format!("제5조 수당. {}. 제6조 기타.", sentence);
        let excerpt = format!("{} 그리고 회사의 재량에 따른다", sentence);
        let (start, end) = anchor_excerpt(&text, Some(&excerpt)).unwrap();
        let anchored = &text[start..end];
        assert!(anchored.contains("청구하지 않기로"));
        assert!(anchored.ends_with('.'));
    }

    #[test]
    fn unanchorable_excerpt_stays_unanchored() {
        let text = "제1조 목적.";
        assert!(anchor_excerpt(text, Some("완전히 다른 문장")).is_none());
        assert!(anchor_excerpt(text, None).is_none());
        assert!(anchor_excerpt(text, Some("   ")).is_none());
    }
}
