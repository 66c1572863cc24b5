//! Core LLM client trait, errors, and a scripted mock

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::types::{Message, Response, ToolDefinition};

/// Language-model collaborator
///
/// Each call receives the full conversation and the full tool registry; the
/// client keeps no conversation state of its own.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Ask the model for the next turn
    async fn chat(&self, history: &[Message], tools: &[ToolDefinition]) -> Result<Response, LlmError>;

    /// Model identifier used for requests
    fn model(&self) -> &str;
}

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing API key: environment variable {env_var} not set")]
    MissingApiKey { env_var: String },
}

/// One scripted reply of the mock client
#[derive(Debug, Clone)]
pub enum MockReply {
    Respond(Response),
    Fail(String),
}

/// Scripted LLM client for tests and offline runs
///
/// Replies are consumed in order. With `repeat_last`, the final reply is
/// returned forever once the script is exhausted.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<MockReply>>,
    repeat_last: Option<MockReply>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockLlmClient {
    /// Create a mock that returns the given responses in order
    pub fn new(responses: Vec<Response>) -> Self {
        Self::scripted(responses.into_iter().map(MockReply::Respond).collect())
    }

    /// Create a mock from an explicit script of replies and failures
    pub fn scripted(replies: Vec<MockReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            repeat_last: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same reply
    pub fn repeating(reply: MockReply) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            repeat_last: Some(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Number of chat calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    /// History snapshots received by each chat call
    pub fn received(&self) -> Vec<Vec<Message>> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn next_reply(&self) -> Option<MockReply> {
        let scripted = self.replies.lock().ok().and_then(|mut replies| replies.pop_front());
        scripted.or_else(|| self.repeat_last.clone())
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn chat(&self, history: &[Message], _tools: &[ToolDefinition]) -> Result<Response, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(history.to_vec());
        }

        match self.next_reply() {
            Some(MockReply::Respond(response)) => Ok(response),
            Some(MockReply::Fail(message)) => Err(LlmError::ApiError { status: 503, message }),
            None => Err(LlmError::InvalidResponse("mock script exhausted".to_string())),
        }
    }

    fn model(&self) -> &str {
        "mock-model"
    }
}
