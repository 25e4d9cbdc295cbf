//! Source taxonomy for the legal corpus

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a legal corpus chunk comes from.
///
/// The retrieval layer's diversity quota is keyed on this: statutes give
/// the letter of the law, manuals give guidance, standard contracts give
/// language to imitate, cases give applied reasoning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Statutory text (e.g. 근로기준법)
    Law,
    /// Government or agency guidance manuals
    Manual,
    /// Standard-form contract templates
    StandardContract,
    /// Applied case scenarios and rulings
    Case,
}

impl SourceType {
    /// Canonical snake_case name, matching the stored metadata value
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Law => "law",
            SourceType::Manual => "manual",
            SourceType::StandardContract => "standard_contract",
            SourceType::Case => "case",
        }
    }

    /// All source types, in diversity-quota priority order
    pub fn all() -> [SourceType; 4] {
        [
            SourceType::Law,
            SourceType::Manual,
            SourceType::StandardContract,
            SourceType::Case,
        ]
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "law" => Ok(SourceType::Law),
            "manual" => Ok(SourceType::Manual),
            "standard_contract" => Ok(SourceType::StandardContract),
            "case" => Ok(SourceType::Case),
            other => Err(format!("Unknown source type: {}", other)),
        }
    }
}

/// How a grounding chunk relates to the issue it is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundingStatus {
    /// The excerpt supports the issue's finding
    Supports,
    /// The excerpt cuts against the finding
    Contradicts,
    /// Relevance could not be determined
    Unclear,
}

impl Default for GroundingStatus {
    fn default() -> Self {
        GroundingStatus::Unclear
    }
}
