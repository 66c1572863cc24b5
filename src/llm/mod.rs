//! LLM Client Layer - message protocol and model transports
//!
//! This module provides:
//! - Message types exchanged with the model
//! - LlmClient trait for API abstraction
//! - AnthropicClient implementation
//! - MockLlmClient for scripted conversations

pub mod anthropic;
pub mod client;
pub mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use client::{LlmClient, LlmError, MockLlmClient, MockReply};
pub use types::{Message, Response, Role, ToolArguments, ToolCall, ToolDefinition, Usage};
