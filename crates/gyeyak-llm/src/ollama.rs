//! Ollama chat backend
//!
//! Talks to a local Ollama instance over `/api/chat`. Requests retry
//! with exponential backoff on transport failures; HTTP 404 maps to a
//! missing model and 429 to rate limiting.

use crate::{ChatMessage, LlmClient, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for LLM requests
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of retry attempts
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Ollama chat API client
pub struct OllamaClient {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

impl OllamaClient {
    /// Create a client for `endpoint` using `model`
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Unavailable(format!("client build failed: {}", e)))?;
        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Client against the default local endpoint
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model, DEFAULT_TIMEOUT)
    }

    /// Override the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.endpoint);
        let request_body = OllamaChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: OllamaOptions { temperature },
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(&request_body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed: OllamaChatResponse = response.json().await.map_err(|e| {
                            LlmError::InvalidResponse(format!("undecodable reply: {}", e))
                        })?;
                        debug!(chars = parsed.message.content.len(), "LLM reply received");
                        return Ok(parsed.message.content);
                    }
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(self.model.clone()));
                    }
                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        return Err(LlmError::RateLimited);
                    }
                    let text = response.text().await.unwrap_or_else(|_| "unknown".to_string());
                    last_error = Some(LlmError::Unavailable(format!("HTTP {}: {}", status, text)));
                }
                Err(e) => {
                    last_error = Some(LlmError::Unavailable(format!("request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!(attempt = attempts, delay_secs = delay.as_secs(), "Retrying LLM call");
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Unavailable("max retries exceeded".to_string())))
    }
}
