//! Grounded chat over analyzed documents
//!
//! Same dual-retrieval pattern as analysis, but the reply is free-form
//! Markdown — no JSON contract and no repair ladder.

use crate::{prompt, Engine, EngineError};
use gyeyak_domain::{DocumentId, Issue};
use gyeyak_llm::ChatMessage;
use gyeyak_store::ContractHit;

/// A grounded chat turn
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// The user's question
    pub query: String,
    /// Documents whose chunks should ground the answer
    pub document_ids: Vec<DocumentId>,
    /// The issue the user is asking about, when one is selected
    pub selected_issue: Option<Issue>,
    /// Summary of the prior analysis, for continuity
    pub analysis_summary: Option<String>,
    /// Prior conversation turns, oldest first
    pub history: Vec<ChatMessage>,
}

impl ChatRequest {
    /// A bare question with no attached context
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }
}

impl Engine {
    /// Answer a question grounded in the legal corpus and the given
    /// documents' chunks. Returns Markdown.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, EngineError> {
        let k = self.config.vector_top_k;

        let legal_future = self.retriever.search_legal(
            &request.query,
            k,
            None,
            self.config.diversity_enabled,
        );
        let contract_future = async {
            let mut hits: Vec<ContractHit> = Vec::new();
            for document_id in &request.document_ids {
                hits.extend(
                    self.retriever
                        .search_contract(
                            *document_id,
                            &request.query,
                            k,
                            request.selected_issue.as_ref(),
                        )
                        .await,
                );
            }
            hits.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            hits.truncate(k);
            hits
        };
        let (legal_chunks, contract_hits) = tokio::join!(legal_future, contract_future);

        let messages = prompt::build_chat_prompt(
            &request.query,
            &contract_hits,
            &legal_chunks,
            request.selected_issue.as_ref(),
            request.analysis_summary.as_deref(),
            &request.history,
        );
        self.complete_with_timeout(&messages).await
    }
}
