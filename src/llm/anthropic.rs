//! Anthropic API client implementation
//!
//! This module implements the LlmClient trait for the Anthropic (Claude) API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::client::{LlmClient, LlmError};
use super::types::{Message, Response, Role, ToolCall, ToolDefinition, Usage};

/// Anthropic API base URL
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default model to use
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default max tokens
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Configuration for the Anthropic client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub api_key_env: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(120),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    config: AnthropicConfig,
}

impl AnthropicClient {
    /// Create a new Anthropic client, reading the key from `config.api_key_env`
    pub fn new(config: AnthropicConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| LlmError::MissingApiKey {
            env_var: config.api_key_env.clone(),
        })?;

        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: AnthropicConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    /// Build the request body for the Anthropic API
    ///
    /// System messages become the `system` field. Consecutive tool results are
    /// folded into one user turn, as the API requires every result of a round
    /// to arrive together.
    fn build_request(&self, history: &[Message], tools: &[ToolDefinition]) -> Value {
        let system: Vec<&str> = history
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let mut messages: Vec<Value> = Vec::new();
        let mut pending_results: Vec<Value> = Vec::new();

        for message in history.iter().filter(|m| m.role != Role::System) {
            if message.is_tool_result() {
                pending_results.push(json!({
                    "type": "tool_result",
                    "tool_use_id": message.tool_result_id,
                    "content": message.content,
                    "is_error": message.is_error
                }));
                continue;
            }

            if !pending_results.is_empty() {
                messages.push(json!({
                    "role": "user",
                    "content": std::mem::take(&mut pending_results)
                }));
            }

            messages.push(Self::message_to_json(message));
        }

        if !pending_results.is_empty() {
            messages.push(json!({
                "role": "user",
                "content": pending_results
            }));
        }

        let mut body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": messages
        });

        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }

        if !tools.is_empty() {
            let tools: Vec<Value> = tools.iter().map(|t| t.to_anthropic_schema()).collect();
            body["tools"] = json!(tools);
        }

        body
    }

    fn message_to_json(message: &Message) -> Value {
        let role = match message.role {
            Role::Assistant => "assistant",
            Role::User | Role::System => "user",
        };

        if message.tool_calls.is_empty() {
            return json!({ "role": role, "content": message.content });
        }

        let mut blocks = Vec::new();
        if !message.content.is_empty() {
            blocks.push(json!({ "type": "text", "text": message.content }));
        }
        for call in &message.tool_calls {
            blocks.push(json!({
                "type": "tool_use",
                "id": call.id,
                "name": call.name,
                "input": call.arguments
            }));
        }

        json!({ "role": role, "content": blocks })
    }

    /// Parse the API response into a Response
    fn parse_response(&self, body: Value) -> Result<Response, LlmError> {
        let blocks = body["content"]
            .as_array()
            .ok_or_else(|| LlmError::InvalidResponse("missing content array".to_string()))?;

        let usage = body
            .get("usage")
            .map(|u| {
                Usage::new(
                    u["input_tokens"].as_u64().unwrap_or(0),
                    u["output_tokens"].as_u64().unwrap_or(0),
                )
            })
            .unwrap_or_default();

        let mut content = String::new();
        let mut tool_calls = Vec::new();

        for block in blocks {
            match block["type"].as_str() {
                Some("text") => {
                    if let Some(text) = block["text"].as_str() {
                        if !content.is_empty() {
                            content.push('\n');
                        }
                        content.push_str(text);
                    }
                }
                Some("tool_use") => {
                    let id = block["id"]
                        .as_str()
                        .filter(|id| !id.is_empty())
                        .ok_or_else(|| LlmError::InvalidResponse("tool_use block without an id".to_string()))?
                        .to_string();
                    let name = block["name"].as_str().unwrap_or("").to_string();
                    tool_calls.push(ToolCall::new(id, name, block["input"].clone()));
                }
                _ => {}
            }
        }

        let done = tool_calls.is_empty() && body["stop_reason"].as_str() != Some("tool_use");

        Ok(Response {
            content,
            tool_calls,
            done,
            usage,
        })
    }

    /// Send a request to the Anthropic API
    async fn send_request(&self, body: Value) -> Result<Value, LlmError> {
        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn chat(&self, history: &[Message], tools: &[ToolDefinition]) -> Result<Response, LlmError> {
        let body = self.build_request(history, tools);
        let response = self.send_request(body).await?;
        self.parse_response(response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AnthropicClient {
        AnthropicClient::with_api_key("test-key".to_string(), AnthropicConfig::default()).unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = AnthropicConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.api_key_env, "ANTHROPIC_API_KEY");
    }

    #[test]
    fn test_missing_api_key() {
        let config = AnthropicConfig {
            api_key_env: "CINEBOT_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let result = AnthropicClient::new(config);
        assert!(matches!(result, Err(LlmError::MissingApiKey { .. })));
    }

    #[test]
    fn test_build_request_lifts_system_prompt() {
        let history = vec![Message::system("You are helpful"), Message::user("Hello")];
        let body = client().build_request(&history, &[]);

        assert_eq!(body["model"], DEFAULT_MODEL);
        assert_eq!(body["system"], "You are helpful");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_build_request_groups_tool_results() {
        let calls = vec![
            ToolCall::new("a", "list_downloads", json!({})),
            ToolCall::new("b", "check_availability", json!({"title": "Alien"})),
        ];
        let history = vec![
            Message::system("sys"),
            Message::user("status?"),
            Message::assistant_tool_calls("", calls),
            Message::tool_result("a", "[]", false),
            Message::tool_result("b", "no media library server configured", true),
        ];

        let body = client().build_request(&history, &[]);
        let messages = body["messages"].as_array().unwrap();

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"][0]["type"], "tool_use");
        assert_eq!(messages[1]["content"][1]["input"]["title"], "Alien");
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"].as_array().unwrap().len(), 2);
        assert_eq!(messages[2]["content"][1]["tool_use_id"], "b");
        assert_eq!(messages[2]["content"][1]["is_error"], true);
    }

    #[test]
    fn test_build_request_with_tools() {
        let tool = ToolDefinition::new(
            "search_movie",
            "Search movies",
            json!({"type": "object", "properties": {"query": {"type": "string"}}, "required": ["query"]}),
        );
        let body = client().build_request(&[Message::user("find Alien")], &[tool]);
        assert_eq!(body["tools"][0]["name"], "search_movie");
    }

    #[test]
    fn test_parse_response_text() {
        let body = json!({
            "content": [{"type": "text", "text": "Hello! How can I help?"}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        });
        let response = client().parse_response(body).unwrap();
        assert_eq!(response.content, "Hello! How can I help?");
        assert!(response.done);
        assert_eq!(response.usage.total(), 15);
    }

    #[test]
    fn test_parse_response_tool_use() {
        let body = json!({
            "content": [
                {"type": "text", "text": "Let me search."},
                {"type": "tool_use", "id": "toolu_1", "name": "search_movie", "input": {"query": "Inception"}}
            ],
            "stop_reason": "tool_use"
        });
        let response = client().parse_response(body).unwrap();
        assert!(!response.done);
        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].arguments["query"], "Inception");
    }

    #[test]
    fn test_parse_response_tool_use_without_id() {
        let body = json!({
            "content": [{"type": "tool_use", "name": "list_downloads", "input": {}}],
            "stop_reason": "tool_use"
        });
        let result = client().parse_response(body);
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));

        let body = json!({
            "content": [{"type": "tool_use", "id": "", "name": "list_downloads", "input": {}}],
            "stop_reason": "tool_use"
        });
        assert!(client().parse_response(body).is_err());
    }

    #[test]
    fn test_parse_response_missing_content() {
        let result = client().parse_response(json!({"type": "error"}));
        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }
}
