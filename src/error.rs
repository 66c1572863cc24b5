//! Error types for Cinebot
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::llm::LlmError;

/// All error types that can occur in Cinebot
#[derive(Debug, Error)]
pub enum CinebotError {
    /// Language model call failed
    #[error("LLM error: {0}")]
    Llm(String),

    /// Tool dispatch failed
    #[error("Tool error: {0}")]
    Tool(String),

    /// Session could not be created or resolved
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration is missing or invalid
    #[error("Config error: {0}")]
    Config(String),

    /// The caller cancelled the request or its deadline passed
    #[error("Request cancelled")]
    Cancelled,

    /// The model kept requesting tools past the configured bound
    #[error("Exceeded maximum of {limit} tool-call rounds")]
    MaxIterations { limit: usize },

    /// HTTP transport error from a collaborator client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<LlmError> for CinebotError {
    fn from(err: LlmError) -> Self {
        CinebotError::Llm(err.to_string())
    }
}

/// Result type alias for Cinebot operations
pub type Result<T> = std::result::Result<T, CinebotError>;
