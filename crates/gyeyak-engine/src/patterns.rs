//! Rule-based safety net for domain-critical clauses
//!
//! LLMs usually flag statutory wage-waiver clauses, but "usually" is
//! not good enough for the single most damaging pattern in Korean
//! employment contracts. The pre-scan runs before the LLM and seeds a
//! hint into the prompt; the post-check synthesizes an issue when the
//! model still missed it. Keep this list in sync with prompt changes.

use gyeyak_domain::{
    GroundingChunk, GroundingStatus, Issue, IssueCategory, LegalBasis, Severity, SourceType,
};
use regex::RegexBuilder;
use std::sync::OnceLock;
use tracing::warn;

/// Toxic clause patterns, case-insensitive and multiline
const WAGE_WAIVER_PATTERNS: &[(&str, &str)] = &[
    (
        "wage_waiver_agreement",
        r"추가\s*수당[^\n]*청구하지\s+않기로\s+합의",
    ),
    (
        "premium_pay_waiver",
        r"연장.?야간.?휴일\s*근로\s*수당[^\n]*별도로\s*청구하지\s+않",
    ),
    (
        "inclusive_wage_waiver",
        r"포괄임금[^\n]*추가[^\n]*수당[^\n]*청구하지\s+않",
    ),
    (
        "statutory_allowance_waiver",
        r"법정\s*수당[^\n]*청구하지\s+않",
    ),
];

/// Keywords whose presence in an issue marks it as covering the waiver
const WAIVER_KEYWORDS: &[&str] = &["수당", "청구", "포괄임금", "포기"];

fn compiled() -> &'static Vec<(&'static str, regex::Regex)> {
    static PATTERNS: OnceLock<Vec<(&'static str, regex::Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        WAGE_WAIVER_PATTERNS
            .iter()
            .map(|(name, pattern)| {
                let re = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
                    .expect("pattern list must compile");
                (*name, re)
            })
            .collect()
    })
}

/// One toxic clause found in the raw contract text
#[derive(Debug, Clone)]
pub struct ToxicMatch {
    /// Pattern name, stable for logging
    pub name: &'static str,
    /// The matched text, verbatim from the contract
    pub matched: String,
    /// Byte offset of the match
    pub start: usize,
}

/// Scan raw contract text for known toxic patterns
pub fn scan(text: &str) -> Vec<ToxicMatch> {
    let mut matches = Vec::new();
    for (name, re) in compiled() {
        if let Some(m) = re.find(text) {
            matches.push(ToxicMatch {
                name,
                matched: m.as_str().to_string(),
                start: m.start(),
            });
        }
    }
    matches
}

/// The system hint appended to the user description when the pre-scan
/// fires. Additive only; the user's own description is never replaced.
pub fn prescan_hint(matches: &[ToxicMatch]) -> Option<String> {
    if matches.is_empty() {
        return None;
    }
    Some(format!(
        "[시스템 참고] 본문에서 법정 수당 청구권 포기로 의심되는 조항이 {}건 탐지되었습니다. \
         해당 조항(예: \"{}\")을 별도의 이슈로 평가하십시오.",
        matches.len(),
        matches[0].matched
    ))
}

/// Whether any returned issue already covers the wage-waiver finding:
/// wage category plus keyword overlap on summary, reason, or clause text.
pub fn covers_wage_waiver(issues: &[Issue]) -> bool {
    issues.iter().any(|issue| {
        if issue.category != IssueCategory::Wage {
            return false;
        }
        let haystack = format!(
            "{} {} {}",
            issue.summary,
            issue.reason,
            issue.original_text.as_deref().unwrap_or("")
        );
        WAIVER_KEYWORDS.iter().any(|keyword| haystack.contains(keyword))
    })
}

/// Synthesize the safety-net issue for a detected waiver the model
/// missed. High severity, fixed statutory basis.
pub fn synthesize_wage_waiver_issue(toxic: &ToxicMatch, issue_id: String) -> Issue {
    warn!(pattern = toxic.name, "LLM missed a detected wage-waiver clause, synthesizing issue");
    let mut issue = Issue::new(
        issue_id,
        IssueCategory::Wage,
        Severity::High,
        "법정 수당 청구권 포기 조항",
        "연장·야간·휴일 근로에 대한 가산수당은 근로기준법이 보장하는 권리로, \
         이를 사전에 포기하기로 하는 합의는 같은 법 제15조에 따라 무효입니다.",
    );
    issue.original_text = Some(toxic.matched.clone());
    issue.suggested_revision = Some(
        "연장·야간·휴일 근로에 대하여는 근로기준법 제56조에 따른 가산수당을 지급한다.".to_string(),
    );
    issue.legal_basis = vec![
        statutory_basis(
            "labor-standards-act-15",
            "근로기준법 제15조",
            "이 법에서 정하는 기준에 미치지 못하는 근로조건을 정한 근로계약은 그 부분에 한정하여 무효로 한다.",
        ),
        statutory_basis(
            "labor-standards-act-56",
            "근로기준법 제56조",
            "사용자는 연장근로에 대하여는 통상임금의 100분의 50 이상을 가산하여 근로자에게 지급하여야 한다.",
        ),
    ];
    issue
}

fn statutory_basis(source_id: &str, title: &str, snippet: &str) -> LegalBasis {
    LegalBasis {
        chunk: GroundingChunk {
            source_id: source_id.to_string(),
            source_type: SourceType::Law,
            title: title.to_string(),
            snippet: snippet.to_string(),
            score: 1.0,
            file_path: None,
        },
        status: GroundingStatus::Supports,
    }
}
