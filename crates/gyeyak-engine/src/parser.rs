//! Structured-output recovery
//!
//! LLMs emit malformed JSON under load, so the parse path is a ladder:
//!
//! 1. strip code fences, cut the outermost balanced `{…}`, parse
//! 2. on failure, rewind to the last balanced close (appending the
//!    closers a truncated reply dropped) and parse again
//! 3. on failure, regex-salvage `risk_score`, `risk_level`, `summary`,
//!    and whatever issue objects survive individually
//!
//! Only when every rung fails does the caller see `InvalidOutput`.

use crate::error::EngineError;
use gyeyak_domain::{
    GroundingChunk, GroundingStatus, Issue, IssueCategory, LegalBasis, Recommendation, RiskLevel,
    Severity, SourceType,
};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Category applied when the model omitted one
const FALLBACK_CATEGORY: &str = "general";

/// A validated analysis reply
#[derive(Debug)]
pub struct ParsedAnalysis {
    /// Clamped to [0, 100]
    pub risk_score: u8,
    /// The model's own level, when it stated one
    pub risk_level: Option<RiskLevel>,
    /// Overall summary
    pub summary: String,
    /// Issues that survived validation
    pub issues: Vec<Issue>,
    /// Recommendations that survived validation
    pub recommendations: Vec<Recommendation>,
}

/// A validated situation-diagnosis reply
#[derive(Debug)]
pub struct ParsedDiagnosis {
    /// The model's stated level
    pub risk_level: Option<RiskLevel>,
    /// Diagnosis summary
    pub summary: String,
    /// Suggested next steps
    pub advice: Vec<String>,
}

#[derive(Deserialize, Default)]
struct RawAnalysis {
    risk_score: Option<f64>,
    risk_level: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    issues: Vec<Value>,
    #[serde(default)]
    recommendations: Vec<Value>,
}

#[derive(Deserialize, Default)]
struct RawIssue {
    issue_id: Option<String>,
    clause_id: Option<String>,
    category: Option<String>,
    severity: Option<String>,
    summary: Option<String>,
    reason: Option<String>,
    original_text: Option<String>,
    suggested_revision: Option<String>,
    #[serde(default)]
    legal_basis: Vec<Value>,
}

#[derive(Deserialize, Default)]
struct RawRecommendation {
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    steps: Vec<String>,
}

#[derive(Deserialize, Default)]
struct RawDiagnosis {
    risk_level: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    advice: Vec<String>,
}

/// Parse an analysis reply through the repair ladder
pub fn parse_analysis(raw: &str) -> Result<ParsedAnalysis, EngineError> {
    let raw_analysis: RawAnalysis = parse_with_ladder(raw)
        .or_else(|| salvage_analysis(raw))
        .ok_or_else(|| {
            EngineError::InvalidOutput(format!(
                "no parseable analysis in reply ({} chars)",
                raw.len()
            ))
        })?;
    Ok(validate_analysis(raw_analysis))
}

/// Parse a situation-diagnosis reply through the repair ladder
pub fn parse_diagnosis(raw: &str) -> Result<ParsedDiagnosis, EngineError> {
    let raw_diagnosis: RawDiagnosis = parse_with_ladder(raw)
        .or_else(|| salvage_diagnosis(raw))
        .ok_or_else(|| {
            EngineError::InvalidOutput(format!(
                "no parseable diagnosis in reply ({} chars)",
                raw.len()
            ))
        })?;
    Ok(ParsedDiagnosis {
        risk_level: raw_diagnosis.risk_level.and_then(|l| l.parse().ok()),
        summary: raw_diagnosis.summary.unwrap_or_default(),
        advice: raw_diagnosis.advice,
    })
}

/// Rungs 1 and 2: balanced extraction, then truncation repair
fn parse_with_ladder<T: serde::de::DeserializeOwned>(raw: &str) -> Option<T> {
    let stripped = strip_code_fences(raw);

    if let Some(slice) = balanced_object(stripped) {
        if let Ok(parsed) = serde_json::from_str(slice) {
            return Some(parsed);
        }
    }

    let repaired = repair_truncated(stripped)?;
    debug!(chars = repaired.len(), "Parsed LLM reply after truncation repair");
    serde_json::from_str(&repaired).ok()
}

/// Remove markdown code fences around the payload, if any
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", ...) on the fence line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim().trim_end_matches("```").trim()
}

/// The outermost balanced `{…}`, respecting strings and escapes
fn balanced_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in s[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => depth += 1,
            '}' | ']' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 && c == '}' {
                    return Some(&s[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Rewind a truncated reply to its last object close and append the
/// closers the truncation dropped.
fn repair_truncated(s: &str) -> Option<String> {
    let start = s.find('{')?;
    let body = &s[start..];

    let close_positions: Vec<usize> = body
        .char_indices()
        .filter(|&(_, c)| c == '}')
        .map(|(i, _)| i)
        .collect();

    for &position in close_positions.iter().rev().take(8) {
        let prefix = &body[..=position];
        let Some(candidate) = close_open_scopes(prefix) else {
            continue;
        };
        if serde_json::from_str::<Value>(&candidate).is_ok() {
            return Some(candidate);
        }
    }
    None
}

/// Append the closing brackets a prefix still owes. Fails when the
/// prefix ends inside a string literal.
fn close_open_scopes(prefix: &str) -> Option<String> {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in prefix.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => stack.push('}'),
            '[' if !in_string => stack.push(']'),
            '}' | ']' if !in_string => {
                stack.pop();
            }
            _ => {}
        }
    }
    if in_string {
        return None;
    }
    let mut out = prefix.to_string();
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    Some(out)
}

fn score_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""risk_score"\s*:\s*([0-9]+(?:\.[0-9]+)?)"#).unwrap())
}

fn level_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""risk_level"\s*:\s*"([A-Za-z]+)""#).unwrap())
}

fn summary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""summary"\s*:\s*"((?:[^"\\]|\\.)*)""#).unwrap())
}

/// Rung 3: pull the headline fields and any individually-parseable
/// issue objects out of an unrecoverable reply.
fn salvage_analysis(raw: &str) -> Option<RawAnalysis> {
    let risk_score = score_re()
        .captures(raw)
        .and_then(|caps| caps[1].parse::<f64>().ok());
    let risk_level = level_re().captures(raw).map(|caps| caps[1].to_string());
    let summary = summary_re().captures(raw).map(|caps| caps[1].to_string());

    if risk_score.is_none() && summary.is_none() {
        return None;
    }
    warn!("Recovered analysis fields by regex salvage");

    let issues = raw
        .find("\"issues\"")
        .map(|at| salvage_objects(&raw[at..]))
        .unwrap_or_default();

    Some(RawAnalysis {
        risk_score,
        risk_level,
        summary,
        issues,
        recommendations: Vec::new(),
    })
}

fn salvage_diagnosis(raw: &str) -> Option<RawDiagnosis> {
    let summary = summary_re().captures(raw).map(|caps| caps[1].to_string())?;
    let risk_level = level_re().captures(raw).map(|caps| caps[1].to_string());
    warn!("Recovered diagnosis fields by regex salvage");
    Some(RawDiagnosis {
        risk_level,
        summary: Some(summary),
        advice: Vec::new(),
    })
}

/// Collect each balanced `{…}` found in sequence
fn salvage_objects(s: &str) -> Vec<Value> {
    let mut objects = Vec::new();
    let mut rest = s;
    while let Some(slice) = balanced_object(rest) {
        if let Ok(value) = serde_json::from_str::<Value>(slice) {
            objects.push(value);
        }
        let consumed = slice.as_ptr() as usize - rest.as_ptr() as usize + slice.len();
        rest = &rest[consumed..];
    }
    objects
}

/// Validation stage: clamp the score, type the enums, skip issues with
/// no substance, and keep whatever grounding the model offered until
/// re-retrieval replaces it.
fn validate_analysis(raw: RawAnalysis) -> ParsedAnalysis {
    let risk_score = raw
        .risk_score
        .map(|score| score.clamp(0.0, 100.0).round() as u8)
        .unwrap_or(50);
    let risk_level = raw.risk_level.and_then(|level| level.parse().ok());
    let summary = raw.summary.unwrap_or_default();

    let issues: Vec<Issue> = raw
        .issues
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| issue_from_value(value, index))
        .collect();

    let recommendations: Vec<Recommendation> = raw
        .recommendations
        .into_iter()
        .filter_map(|value| {
            let raw: RawRecommendation = serde_json::from_value(value).ok()?;
            let title = raw.title?;
            Some(Recommendation {
                title,
                description: raw.description.unwrap_or_default(),
                steps: raw.steps,
            })
        })
        .collect();

    ParsedAnalysis {
        risk_score,
        risk_level,
        summary,
        issues,
        recommendations,
    }
}

fn issue_from_value(value: Value, index: usize) -> Option<Issue> {
    let raw: RawIssue = match serde_json::from_value(value) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(index, error = %e, "Skipping unparseable issue");
            return None;
        }
    };

    let summary = raw.summary.unwrap_or_default();
    let reason = raw.reason.unwrap_or_default();
    if summary.trim().is_empty() && reason.trim().is_empty() {
        warn!(index, "Skipping issue with no summary or reason");
        return None;
    }

    let severity = raw
        .severity
        .and_then(|s| s.parse::<Severity>().ok())
        .unwrap_or(Severity::Medium);
    let category = raw
        .category
        .map(|c| IssueCategory::parse(&c))
        .unwrap_or_else(|| IssueCategory::Other(FALLBACK_CATEGORY.to_string()));

    let mut issue = Issue::new(
        raw.issue_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("issue-{}", index + 1)),
        category,
        severity,
        summary,
        reason,
    );
    issue.clause_id = raw.clause_id.filter(|id| !id.trim().is_empty());
    issue.original_text = raw.original_text.filter(|t| !t.trim().is_empty());
    issue.suggested_revision = raw.suggested_revision.filter(|t| !t.trim().is_empty());
    issue.legal_basis = raw
        .legal_basis
        .into_iter()
        .filter_map(basis_from_value)
        .collect();
    Some(issue)
}

/// The schema allows `legal_basis` entries as plain strings or objects;
/// both become untyped grounding placeholders that per-issue
/// re-retrieval replaces when the corpus has something better.
fn basis_from_value(value: Value) -> Option<LegalBasis> {
    let (title, snippet) = match value {
        Value::String(s) if !s.trim().is_empty() => (s.clone(), s),
        Value::Object(map) => {
            let title = map
                .get("title")
                .or_else(|| map.get("source"))
                .or_else(|| map.get("name"))
                .and_then(Value::as_str)?
                .to_string();
            let snippet = map
                .get("snippet")
                .or_else(|| map.get("content"))
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            (title, snippet)
        }
        _ => return None,
    };
    Some(LegalBasis {
        chunk: GroundingChunk {
            source_id: String::new(),
            source_type: SourceType::Law,
            title,
            snippet,
            score: 0.0,
            file_path: None,
        },
        status: GroundingStatus::Unclear,
    })
}
