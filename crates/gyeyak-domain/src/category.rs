//! Issue categories for Korean employment-contract findings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a risk finding.
///
/// The known variants drive the per-section score breakdown and the
/// `topic_main` retrieval filter. The set is open: categories the LLM
/// invents land in `Other` and still round-trip through JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IssueCategory {
    /// Wages, allowances, statutory premium pay
    Wage,
    /// Working hours, overtime, breaks
    WorkingHours,
    /// Probation periods, dismissal, termination
    ProbationTermination,
    /// Stock options, inventions, intellectual property
    StockOptionIp,
    /// Annual leave and holidays
    Leave,
    /// Non-compete and confidentiality obligations
    NonCompete,
    /// Anything else the model labels
    Other(String),
}

impl IssueCategory {
    /// Canonical snake_case tag, matching corpus `topic_main` metadata
    pub fn as_str(&self) -> &str {
        match self {
            IssueCategory::Wage => "wage",
            IssueCategory::WorkingHours => "working_hours",
            IssueCategory::ProbationTermination => "probation_termination",
            IssueCategory::StockOptionIp => "stock_option_ip",
            IssueCategory::Leave => "leave",
            IssueCategory::NonCompete => "non_compete",
            IssueCategory::Other(s) => s.as_str(),
        }
    }

    /// Parse a tag, mapping unknown values to `Other`
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "wage" => IssueCategory::Wage,
            "working_hours" => IssueCategory::WorkingHours,
            "probation_termination" => IssueCategory::ProbationTermination,
            "stock_option_ip" => IssueCategory::StockOptionIp,
            "leave" => IssueCategory::Leave,
            "non_compete" => IssueCategory::NonCompete,
            other => IssueCategory::Other(other.to_string()),
        }
    }
}

impl From<String> for IssueCategory {
    fn from(s: String) -> Self {
        IssueCategory::parse(&s)
    }
}

impl From<IssueCategory> for String {
    fn from(c: IssueCategory) -> String {
        match c {
            IssueCategory::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_categories_round_trip() {
        for tag in [
            "wage",
            "working_hours",
            "probation_termination",
            "stock_option_ip",
            "leave",
            "non_compete",
        ] {
            let cat = IssueCategory::parse(tag);
            assert!(!matches!(cat, IssueCategory::Other(_)), "{} parsed as Other", tag);
            assert_eq!(cat.as_str(), tag);
        }
    }

    #[test]
    fn test_unknown_category_preserved() {
        let cat = IssueCategory::parse("salary_cap");
        assert_eq!(cat, IssueCategory::Other("salary_cap".to_string()));

        let json = serde_json::to_string(&cat).unwrap();
        assert_eq!(json, "\"salary_cap\"");
        let back: IssueCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cat);
    }

    #[test]
    fn test_serde_round_trip_known() {
        let json = serde_json::to_string(&IssueCategory::WorkingHours).unwrap();
        assert_eq!(json, "\"working_hours\"");
        let back: IssueCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, IssueCategory::WorkingHours);
    }
}
