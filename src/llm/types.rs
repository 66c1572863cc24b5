//! Message protocol shared between the agent and the language model
//!
//! Pure data: messages, tool calls, tool definitions and model responses.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// Loosely-typed tool arguments as produced by the model
pub type ToolArguments = Map<String, Value>;

/// A message in the conversation
///
/// A message carrying a `tool_result_id` answers the tool call with that id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result_id: Option<String>,
    #[serde(default)]
    pub is_error: bool,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_result_id: None,
            is_error: false,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message recording the tool calls of one round
    pub fn assistant_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Create a tool-result message answering the call with `tool_call_id`
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        Self {
            tool_result_id: Some(tool_call_id.into()),
            is_error,
            ..Self::new(Role::User, content)
        }
    }

    /// Whether this message answers a tool call
    pub fn is_tool_result(&self) -> bool {
        self.tool_result_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// Tool definition advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Convert to Anthropic API schema format
    pub fn to_anthropic_schema(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema
        })
    }
}

/// A tool call from the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub arguments: ToolArguments,
}

impl ToolCall {
    /// Create a new tool call
    ///
    /// Non-object inputs are treated as an empty argument mapping.
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        let arguments = match input {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Answer of the model to one chat invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub done: bool,
    #[serde(default)]
    pub usage: Usage,
}

impl Response {
    /// A final text answer with no tool calls
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            done: true,
            usage: Usage::default(),
        }
    }

    /// A response requesting tool calls
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            done: false,
            usage: Usage::default(),
        }
    }

    /// Whether the model asked for tools this round
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl Usage {
    /// Create new usage stats
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Calculate total tokens
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    /// Accumulate usage from another instance
    pub fn add(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
    }

    #[test]
    fn test_message_constructors() {
        let msg = Message::system("be brief");
        assert_eq!(msg.role, Role::System);
        assert!(!msg.is_tool_result());

        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(msg.tool_calls.is_empty());
        assert!(!msg.is_error);
    }

    #[test]
    fn test_tool_result_message() {
        let msg = Message::tool_result("call_1", "no metadata provider configured", true);
        assert!(msg.is_tool_result());
        assert_eq!(msg.tool_result_id.as_deref(), Some("call_1"));
        assert!(msg.is_error);
    }

    #[test]
    fn test_empty_tool_result_id_is_not_a_result() {
        let mut msg = Message::user("hi");
        msg.tool_result_id = Some(String::new());
        assert!(!msg.is_tool_result());
    }

    #[test]
    fn test_tool_call_new_object_input() {
        let call = ToolCall::new("call_123", "search_movie", json!({"query": "Alien"}));
        assert_eq!(call.id, "call_123");
        assert_eq!(call.name, "search_movie");
        assert_eq!(call.arguments["query"], "Alien");
    }

    #[test]
    fn test_tool_call_new_non_object_input() {
        let call = ToolCall::new("call_1", "list_downloads", json!(null));
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_response_helpers() {
        let resp = Response::text("done");
        assert!(resp.done);
        assert!(!resp.wants_tools());

        let resp = Response::with_tool_calls("", vec![ToolCall::new("1", "list_downloads", json!({}))]);
        assert!(!resp.done);
        assert!(resp.wants_tools());
    }

    #[test]
    fn test_tool_definition_to_anthropic_schema() {
        let tool = ToolDefinition::new(
            "search_movie",
            "Search movies",
            json!({"type": "object", "properties": {"query": {"type": "string"}}, "required": ["query"]}),
        );
        let schema = tool.to_anthropic_schema();
        assert_eq!(schema["name"], "search_movie");
        assert!(schema["input_schema"].is_object());
    }

    #[test]
    fn test_usage_add() {
        let mut usage = Usage::new(100, 50);
        usage.add(&Usage::new(200, 100));
        assert_eq!(usage.total(), 450);
    }
}
