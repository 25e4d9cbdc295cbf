//! Root analysis outputs and their stable JSON shapes

use crate::category::IssueCategory;
use crate::document::{DocumentId, GroundingChunk};
use crate::issue::{Issue, Recommendation};
use crate::risk::RiskLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity-weighted score breakdown across the four tracked sections.
///
/// Each section accumulates the weights of its issues (high 30, medium
/// 15, low 5) and is capped at 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionScores {
    /// Working-hours findings
    pub working_hours: u32,
    /// Wage findings
    pub wage: u32,
    /// Probation and termination findings
    pub probation_termination: u32,
    /// Stock option and IP findings
    pub stock_option_ip: u32,
}

impl SectionScores {
    /// Compute the breakdown from a report's issues
    pub fn from_issues(issues: &[Issue]) -> Self {
        let mut scores = SectionScores::default();
        for issue in issues {
            let slot = match issue.category {
                IssueCategory::WorkingHours => &mut scores.working_hours,
                IssueCategory::Wage => &mut scores.wage,
                IssueCategory::ProbationTermination => &mut scores.probation_termination,
                IssueCategory::StockOptionIp => &mut scores.stock_option_ip,
                _ => continue,
            };
            *slot = (*slot + issue.severity.weight()).min(100);
        }
        scores
    }
}

/// A contract clause surfaced in the report, derived from the
/// article-aligned chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clause {
    /// Stable clause id (`article-N` or `preamble`)
    pub clause_id: String,
    /// Article number, when the clause came from a numbered article
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_number: Option<u32>,
    /// Clause text
    pub text: String,
}

/// A highlighted span for an anchored issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightedText {
    /// Issue this highlight belongs to
    pub issue_id: String,
    /// The anchored excerpt
    pub text: String,
    /// Byte offset into the contract text
    pub start_index: usize,
    /// End byte offset
    pub end_index: usize,
}

/// Root output of a contract analysis. Field names follow the stable
/// camelCase wire shape consumed downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Analyzed document id
    pub doc_id: DocumentId,
    /// Document title
    pub title: String,
    /// Overall risk score in [0, 100]
    pub risk_score: u8,
    /// low / medium / high
    pub risk_level: RiskLevel,
    /// True when the LLM's stated level disagreed with the derived one
    /// and was preserved
    #[serde(default)]
    pub level_overridden: bool,
    /// Severity-weighted per-section breakdown
    pub sections: SectionScores,
    /// Ordered risk findings
    pub issues: Vec<Issue>,
    /// Overall summary
    pub summary: String,
    /// Actionable recommendations
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    /// Top-level grounding for the whole analysis; empty when retrieval
    /// found nothing above the similarity threshold
    pub retrieved_contexts: Vec<GroundingChunk>,
    /// The full extracted contract text
    pub contract_text: String,
    /// Article-aligned clauses
    #[serde(default)]
    pub clauses: Vec<Clause>,
    /// Highlights for anchored issues
    #[serde(default)]
    pub highlighted_texts: Vec<HighlightedText>,
    /// Report creation time (ISO 8601)
    pub created_at: DateTime<Utc>,
}

/// Input for an ad-hoc legal situation analysis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SituationRequest {
    /// The user's description of their situation
    pub text: String,
    /// Category hint narrowing the corpus search
    #[serde(default)]
    pub category_hint: Option<IssueCategory>,
    /// Employment type (정규직, 프리랜서, ...)
    #[serde(default)]
    pub employment_type: Option<String>,
    /// Months at the current workplace
    #[serde(default)]
    pub tenure_months: Option<u32>,
    /// Contracted weekly hours
    #[serde(default)]
    pub weekly_hours: Option<u32>,
}

/// Output of a situation analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisReport {
    /// Assessed risk level for the described situation
    pub risk_level: RiskLevel,
    /// Plain-language assessment
    pub summary: String,
    /// Suggested next steps
    #[serde(default)]
    pub advice: Vec<String>,
    /// Statutes and guidance grounding the assessment
    pub legal_basis: Vec<GroundingChunk>,
    /// Applied case scenarios similar to the situation
    pub related_cases: Vec<GroundingChunk>,
}
