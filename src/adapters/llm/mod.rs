pub mod providers;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::core::ports::llm::{DynError, GenerateRequest, LlmPort};

#[derive(Debug)]
pub enum StreamEvent {
    Text(String),
    Usage(TokenUsage),
    Done,
    #[allow(dead_code)]
    Error(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TokenUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

impl TokenUsage {
    pub fn is_empty(&self) -> bool {
        self.input_tokens.is_none() && self.output_tokens.is_none() && self.total_tokens.is_none()
    }

    /// Gemini repeats cumulative usage on every chunk; keep the maximum
    /// seen per field.
    pub fn merge_max_assign(&mut self, other: &TokenUsage) {
        self.input_tokens = max_optional(self.input_tokens, other.input_tokens);
        self.output_tokens = max_optional(self.output_tokens, other.output_tokens);
        self.total_tokens = max_optional(self.total_tokens, other.total_tokens);
    }
}

fn max_optional(current: Option<u64>, candidate: Option<u64>) -> Option<u64> {
    match (current, candidate) {
        (Some(lhs), Some(rhs)) => Some(lhs.max(rhs)),
        (None, Some(rhs)) => Some(rhs),
        (Some(lhs), None) => Some(lhs),
        (None, None) => None,
    }
}

pub async fn generate_stream(request: GenerateRequest) -> Result<(), DynError> {
    match request.provider.as_str() {
        "google" => providers::google::generate_stream(request).await,
        other => Err(format!("Unknown chat provider: {other}").into()),
    }
}

pub struct ChatLlmAdapter;

impl Default for ChatLlmAdapter {
    fn default() -> Self {
        Self
    }
}

impl ChatLlmAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl LlmPort for ChatLlmAdapter {
    fn generate(&self, request: GenerateRequest) -> BoxFuture<'_, Result<(), DynError>> {
        Box::pin(generate_stream(request))
    }
}
