//! Judge backend trait definitions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::runner::rate_limiter::RateLimiter;

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Request for a completion from a judge backend
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: Option<String>,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>, max_tokens: u32) -> Self {
        Self {
            model: None,
            messages,
            max_tokens,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// Response from a judge backend
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub latency_ms: u64,
}

/// Error types for judge calls. `RateLimited` is the only transient class
/// that keeps its retry budget; auth and quota problems surface as `Config`
/// so the retry loop can give up immediately.
#[derive(Debug, thiserror::Error)]
pub enum JudgeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl JudgeError {
    /// Whether retrying the same call can plausibly succeed. Network and
    /// auth failures are not retried; the judge is skipped for the exercise.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            JudgeError::RateLimited { .. } | JudgeError::Timeout { .. }
        )
    }
}

pub type JudgeResult<T> = Result<T, JudgeError>;

/// Trait for judge backends
#[async_trait]
pub trait JudgeBackend: Send + Sync {
    /// Judge identity used in output records (e.g. "gpt-4o-mini")
    fn name(&self) -> &str;

    /// Model id sent to the API
    fn model(&self) -> &str;

    /// Send a completion request
    async fn complete(&self, request: &CompletionRequest) -> JudgeResult<CompletionResponse>;

    /// Rate limiter shared by all calls to this backend
    fn rate_limiter(&self) -> &Arc<RateLimiter>;
}
