//! Gyeyak LLM Provider Layer
//!
//! Pluggable chat-completion backends behind one async trait. The
//! engine instructs the model to return strictly JSON for analysis
//! tasks and strictly Markdown for chat; recovering from violations is
//! the engine's job, not this crate's.
//!
//! # Providers
//!
//! - `MockLlm`: deterministic mock for testing
//! - `OllamaClient`: local Ollama chat API
//!
//! # Examples
//!
//! ```
//! use gyeyak_llm::{ChatMessage, LlmClient, MockLlm};
//!
//! # tokio_test::block_on(async {
//! let llm = MockLlm::new("{\"risk_score\": 10}");
//! let answer = llm
//!     .complete(&[ChatMessage::user("분석해 주세요")], 0.5)
//!     .await
//!     .unwrap();
//! assert_eq!(answer, "{\"risk_score\": 10}");
//! # });
//! ```

#![warn(missing_docs)]

pub mod ollama;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use ollama::OllamaClient;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// The backend could not be reached or timed out
    #[error("LLM unavailable: {0}")]
    Unavailable(String),

    /// The backend rate-limited the request
    #[error("LLM rate limit exceeded")]
    RateLimited,

    /// The configured model does not exist on the backend
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// The backend answered with something undecodable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Speaker role in a chat exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// End-user turn
    User,
    /// Model turn
    Assistant,
}

/// One message of an ordered chat exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who is speaking
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// A system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A chat-completion backend
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Submit an ordered message sequence, get the model's reply text
    async fn complete(&self, messages: &[ChatMessage], temperature: f32)
        -> Result<String, LlmError>;
}

/// Deterministic mock backend for tests.
///
/// Replies are served from a scripted queue; when the queue is empty
/// the default response is returned. Every prompt is recorded so tests
/// can assert on what the engine actually sent.
#[derive(Clone)]
pub struct MockLlm {
    default_response: String,
    scripted: Arc<Mutex<VecDeque<Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl MockLlm {
    /// Mock that answers every call with `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            scripted: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a response for the next call; earlier pushes answer first
    pub fn push_response(&self, response: impl Into<String>) {
        self.scripted
            .lock()
            .unwrap()
            .push_back(Ok(response.into()));
    }

    /// Queue a failure for the next call
    pub fn push_error(&self, reason: impl Into<String>) {
        self.scripted
            .lock()
            .unwrap()
            .push_back(Err(reason.into()));
    }

    /// Number of completed calls
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// The message sequences passed to each call, in order
    pub fn recorded_prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _temperature: f32,
    ) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        match self.scripted.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(LlmError::Unavailable(reason)),
            None => Ok(self.default_response.clone()),
        }
    }
}
