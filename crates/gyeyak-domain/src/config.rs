//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs shared across the retrieval and analysis pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// LRU capacity of the embedding cache
    pub embedding_cache_size: usize,

    /// Default k for retrieval results
    pub vector_top_k: usize,

    /// Whether legal search applies the source-type diversity quota
    pub diversity_enabled: bool,

    /// Candidate pool size requested when diversity is on
    pub candidate_k: usize,

    /// Minimum top-candidate similarity; below this the whole retrieval
    /// is discarded
    pub similarity_threshold: f32,

    /// Sampling temperature for LLM calls
    pub llm_temperature: f32,

    /// Timeout for a single LLM call (milliseconds)
    pub llm_timeout_ms: u64,

    /// Timeout for a single vector store call (milliseconds)
    pub vector_timeout_ms: u64,

    /// Maximum issues carried into a report
    pub max_issues: usize,

    /// Contract text window included verbatim in the analysis prompt
    pub max_contract_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            embedding_cache_size: 100,
            vector_top_k: 8,
            diversity_enabled: true,
            candidate_k: 20,
            similarity_threshold: 0.4,
            llm_temperature: 0.5,
            llm_timeout_ms: 30_000,
            vector_timeout_ms: 10_000,
            max_issues: 20,
            max_contract_chars: 6_000,
        }
    }
}

impl EngineConfig {
    /// LLM call timeout as a Duration
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }

    /// Vector store call timeout as a Duration
    pub fn vector_timeout(&self) -> Duration {
        Duration::from_millis(self.vector_timeout_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.embedding_cache_size == 0 {
            return Err("embedding_cache_size must be greater than 0".to_string());
        }
        if self.vector_top_k == 0 {
            return Err("vector_top_k must be greater than 0".to_string());
        }
        if self.candidate_k < self.vector_top_k {
            return Err("candidate_k cannot be smaller than vector_top_k".to_string());
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err("similarity_threshold must be within [0, 1]".to_string());
        }
        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err("llm_temperature must be within [0, 2]".to_string());
        }
        if self.llm_timeout_ms == 0 || self.vector_timeout_ms == 0 {
            return Err("timeouts must be greater than 0".to_string());
        }
        if self.max_issues == 0 {
            return Err("max_issues must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_values_match_contract() {
        let config = EngineConfig::default();
        assert_eq!(config.embedding_cache_size, 100);
        assert_eq!(config.vector_top_k, 8);
        assert!(config.diversity_enabled);
        assert_eq!(config.similarity_threshold, 0.4);
        assert_eq!(config.llm_temperature, 0.5);
        assert_eq!(config.llm_timeout_ms, 30_000);
        assert_eq!(config.max_issues, 20);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = EngineConfig::default();
        config.similarity_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_candidate_k_must_cover_top_k() {
        let mut config = EngineConfig::default();
        config.candidate_k = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = EngineConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = EngineConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let parsed = EngineConfig::from_toml("vector_top_k = 5").unwrap();
        assert_eq!(parsed.vector_top_k, 5);
        assert_eq!(parsed.embedding_cache_size, 100);
    }
}
