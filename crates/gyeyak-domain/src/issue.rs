//! Issues — categorized, grounded risk findings

use crate::category::IssueCategory;
use crate::document::GroundingChunk;
use crate::risk::Severity;
use crate::source::GroundingStatus;
use serde::{Deserialize, Serialize};

/// A grounding chunk attached to an issue, with the model's judgement of
/// how the excerpt relates to the finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalBasis {
    /// The evidence excerpt
    #[serde(flatten)]
    pub chunk: GroundingChunk,
    /// supports / contradicts / unclear
    #[serde(default)]
    pub status: GroundingStatus,
}

impl LegalBasis {
    /// Wrap a grounding chunk with the default `unclear` status
    pub fn new(chunk: GroundingChunk) -> Self {
        Self {
            chunk,
            status: GroundingStatus::Unclear,
        }
    }
}

/// A single risk finding extracted from a contract.
///
/// When `original_text` is present it is a verbatim (or near-verbatim)
/// excerpt of the document text; `start_index`/`end_index` are byte
/// offsets into that text, or null when no anchor was found. Offsets are
/// never fabricated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable identifier within the report
    pub issue_id: String,
    /// Link to a contract clause, when the model provided one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause_id: Option<String>,
    /// Finding category
    pub category: IssueCategory,
    /// Finding severity
    pub severity: Severity,
    /// One-line summary
    pub summary: String,
    /// Why this is a problem
    pub reason: String,
    /// Verbatim excerpt from the contract, when quotable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    /// Proposed replacement language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_revision: Option<String>,
    /// Byte offset of the anchored excerpt in the document text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    /// End byte offset of the anchored excerpt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<usize>,
    /// Statutory and guidance excerpts grounding this finding
    #[serde(default)]
    pub legal_basis: Vec<LegalBasis>,
}

impl Issue {
    /// Create an issue with the given id, category, and severity; the
    /// optional fields start empty.
    pub fn new(
        issue_id: impl Into<String>,
        category: IssueCategory,
        severity: Severity,
        summary: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            issue_id: issue_id.into(),
            clause_id: None,
            category,
            severity,
            summary: summary.into(),
            reason: reason.into(),
            original_text: None,
            suggested_revision: None,
            start_index: None,
            end_index: None,
            legal_basis: Vec::new(),
        }
    }
}

/// An actionable recommendation attached to the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Short label
    pub title: String,
    /// What to do and why
    pub description: String,
    /// Concrete steps, in order
    #[serde(default)]
    pub steps: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceType;

    #[test]
    fn test_issue_serde_round_trip() {
        let mut issue = Issue::new(
            "issue-1",
            IssueCategory::Wage,
            Severity::High,
            "연장근로 수당 포기 조항",
            "근로기준법 제56조가 정한 가산수당 청구권은 사전 포기할 수 없습니다.",
        );
        issue.original_text = Some("추가 수당을 청구하지 않기로 합의한다".to_string());
        issue.legal_basis.push(LegalBasis::new(GroundingChunk {
            source_id: "deadbeef".to_string(),
            source_type: SourceType::Law,
            title: "근로기준법 제56조".to_string(),
            snippet: "연장근로에 대하여는 통상임금의 100분의 50 이상을 가산하여".to_string(),
            score: 0.87,
            file_path: None,
        }));

        let json = serde_json::to_string(&issue).unwrap();
        let back: Issue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, issue);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = r#"{
            "issue_id": "i1",
            "category": "working_hours",
            "severity": "medium",
            "summary": "주 52시간 초과",
            "reason": "연장근로 한도를 초과합니다."
        }"#;
        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.category, IssueCategory::WorkingHours);
        assert!(issue.original_text.is_none());
        assert!(issue.legal_basis.is_empty());
        assert!(issue.start_index.is_none());
    }

    #[test]
    fn test_legal_basis_flattens_chunk_fields() {
        let basis = LegalBasis::new(GroundingChunk {
            source_id: "s1".to_string(),
            source_type: SourceType::Manual,
            title: "표준 근로계약서 작성 안내".to_string(),
            snippet: "...".to_string(),
            score: 0.5,
            file_path: None,
        });
        let json = serde_json::to_value(&basis).unwrap();
        assert_eq!(json["source_id"], "s1");
        assert_eq!(json["status"], "unclear");
        // Flattened: no nested "chunk" object
        assert!(json.get("chunk").is_none());
    }
}
