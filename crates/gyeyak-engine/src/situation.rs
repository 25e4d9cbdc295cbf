//! Ad-hoc legal situation analysis
//!
//! One query embedding is shared by two concurrent corpus searches — a
//! category-filtered general search and a cases-only search — before a
//! single LLM call produces the diagnosis.

use crate::{parser, prompt, Engine, EngineError};
use gyeyak_domain::{DiagnosisReport, RiskLevel, SituationRequest};
use std::collections::HashMap;

impl Engine {
    /// Diagnose a described work situation against the legal corpus
    pub async fn analyze_situation(
        &self,
        request: &SituationRequest,
    ) -> Result<DiagnosisReport, EngineError> {
        let query = build_situation_query(request);
        let k = self.config.vector_top_k;

        let (legal_basis, related_cases) = match self.retriever.embed_query(&query).await {
            Some(embedding) => {
                let mut legal_filters = HashMap::new();
                if let Some(category) = &request.category_hint {
                    legal_filters.insert("topic_main".to_string(), category.as_str().to_string());
                }
                let mut case_filters = HashMap::new();
                case_filters.insert("source_type".to_string(), "case".to_string());

                let legal_future = self.retriever.search_legal_with_embedding(
                    &embedding,
                    k,
                    &legal_filters,
                    self.config.diversity_enabled,
                );
                let cases_future = self.retriever.search_legal_with_embedding(
                    &embedding,
                    k,
                    &case_filters,
                    false,
                );
                tokio::join!(legal_future, cases_future)
            }
            None => (Vec::new(), Vec::new()),
        };

        let messages = prompt::build_situation_prompt(request, &legal_basis, &related_cases);
        let raw = self.complete_with_timeout(&messages).await?;
        let parsed = parser::parse_diagnosis(&raw)?;

        Ok(DiagnosisReport {
            risk_level: parsed.risk_level.unwrap_or(RiskLevel::Medium),
            summary: parsed.summary,
            advice: parsed.advice,
            legal_basis,
            related_cases,
        })
    }
}

/// The retrieval query for a situation: the description, the category
/// tag, and whatever profile facts were given.
fn build_situation_query(request: &SituationRequest) -> String {
    let mut parts = vec![request.text.clone()];
    if let Some(category) = &request.category_hint {
        parts.push(category.as_str().to_string());
    }
    if let Some(employment_type) = request.employment_type.as_deref() {
        parts.push(employment_type.to_string());
    }
    if let Some(hours) = request.weekly_hours {
        parts.push(format!("주 {}시간 근무", hours));
    }
    parts.join("\n")
}
