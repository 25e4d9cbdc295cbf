//! CLI configuration: engine tuning plus backend endpoints.

use gyeyak_domain::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Backend wiring for the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Ollama endpoint for both chat and embeddings
    pub ollama_url: String,
    /// Chat model name
    pub llm_model: String,
    /// Embedding model name
    pub embed_model: String,
    /// Embedding dimension of `embed_model`
    pub embed_dimension: usize,
    /// Remote vector store endpoint; in-memory when unset
    pub vector_url: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            llm_model: "llama3".to_string(),
            embed_model: "bge-m3".to_string(),
            embed_dimension: 1024,
            vector_url: None,
        }
    }
}

/// Top-level CLI configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine tuning knobs
    pub engine: EngineConfig,
    /// Backend endpoints
    pub backends: BackendConfig,
}

impl AppConfig {
    /// Load from a TOML file; a missing path yields the defaults
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        let config: Self = toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
        config
            .engine
            .validate()
            .map_err(|e| anyhow::anyhow!("invalid engine config: {}", e))?;
        Ok(config)
    }
}
