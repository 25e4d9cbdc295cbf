//! Terminal rendering of analysis results.

use colored::Colorize;
use gyeyak_domain::{AnalysisReport, DiagnosisReport, RiskLevel, Severity};

/// Renders reports for the terminal
pub struct Formatter;

impl Formatter {
    /// Create a formatter; `color = false` for plain output
    pub fn new(color: bool) -> Self {
        if !color {
            colored::control::set_override(false);
        }
        Self
    }

    fn level_label(&self, level: RiskLevel) -> String {
        let label = match level {
            RiskLevel::High => "높음".red().bold(),
            RiskLevel::Medium => "중간".yellow().bold(),
            RiskLevel::Low => "낮음".green().bold(),
        };
        label.to_string()
    }

    fn severity_label(&self, severity: Severity) -> String {
        let label = match severity {
            Severity::High => "높음".red(),
            Severity::Medium => "중간".yellow(),
            Severity::Low => "낮음".green(),
        };
        label.to_string()
    }

    /// Human-readable analysis report
    pub fn format_report(&self, report: &AnalysisReport) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{}  {}\n",
            "계약서 위험 분석".bold(),
            report.title
        ));
        out.push_str(&format!(
            "위험 점수: {} / 100  (등급: {})\n",
            report.risk_score,
            self.level_label(report.risk_level)
        ));
        if report.level_overridden {
            out.push_str("※ 모델이 점수 기준과 다른 등급을 제시하여 그대로 표시합니다.\n");
        }
        out.push_str(&format!("\n{}\n", report.summary));

        if report.issues.is_empty() {
            out.push_str("\n발견된 이슈가 없습니다.\n");
        } else {
            out.push_str(&format!("\n{} ({}건)\n", "이슈".bold(), report.issues.len()));
            for issue in &report.issues {
                out.push_str(&format!(
                    "\n[{}] {} (심각도: {})\n",
                    issue.category,
                    issue.summary,
                    self.severity_label(issue.severity)
                ));
                out.push_str(&format!("  {}\n", issue.reason));
                if let Some(original) = issue.original_text.as_deref() {
                    out.push_str(&format!("  원문: \"{}\"\n", original));
                }
                for basis in &issue.legal_basis {
                    out.push_str(&format!("  근거: {} ({})\n", basis.chunk.title, basis.status_label()));
                }
            }
        }

        if !report.retrieved_contexts.is_empty() {
            out.push_str(&format!("\n{}\n", "참고 자료".bold()));
            for context in &report.retrieved_contexts {
                out.push_str(&format!(
                    "  [{}] {} (유사도 {:.2})\n",
                    context.source_type, context.title, context.score
                ));
            }
        }
        out
    }

    /// Human-readable situation diagnosis
    pub fn format_diagnosis(&self, diagnosis: &DiagnosisReport) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{}  (위험도: {})\n\n{}\n",
            "상황 진단".bold(),
            self.level_label(diagnosis.risk_level),
            diagnosis.summary
        ));
        if !diagnosis.advice.is_empty() {
            out.push_str(&format!("\n{}\n", "권고".bold()));
            for (index, advice) in diagnosis.advice.iter().enumerate() {
                out.push_str(&format!("  {}. {}\n", index + 1, advice));
            }
        }
        if !diagnosis.legal_basis.is_empty() {
            out.push_str(&format!("\n{}\n", "관련 법령".bold()));
            for chunk in &diagnosis.legal_basis {
                out.push_str(&format!("  [{}] {}\n", chunk.source_type, chunk.title));
            }
        }
        if !diagnosis.related_cases.is_empty() {
            out.push_str(&format!("\n{}\n", "유사 사례".bold()));
            for case in &diagnosis.related_cases {
                out.push_str(&format!("  {}\n", case.title));
            }
        }
        out
    }
}

trait StatusLabel {
    fn status_label(&self) -> &'static str;
}

impl StatusLabel for gyeyak_domain::LegalBasis {
    fn status_label(&self) -> &'static str {
        match self.status {
            gyeyak_domain::GroundingStatus::Supports => "근거 일치",
            gyeyak_domain::GroundingStatus::Contradicts => "상충",
            gyeyak_domain::GroundingStatus::Unclear => "불명확",
        }
    }
}
