//! Tool registry - fixed catalog advertised to the model and name-based dispatch

use std::collections::HashMap;

use log::debug;

use super::{
    CheckAvailabilityTool, DownloadMovieTool, GetDownloadStatusTool, GetMovieDetailsTool, GetWatchLinkTool,
    ListDownloadsTool, RecommendSimilarTool, SearchMovieTool, Tool, ToolContext, ToolOutput,
};
use crate::llm::{ToolCall, ToolDefinition};

/// Ordered set of tools, built once and never mutated
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
    index: HashMap<&'static str, usize>,
    definitions: Vec<ToolDefinition>,
}

impl ToolRegistry {
    /// The eight media tools, in advertised order
    pub fn standard() -> Self {
        Self::from_tools(vec![
            Box::new(SearchMovieTool),
            Box::new(GetMovieDetailsTool),
            Box::new(DownloadMovieTool),
            Box::new(GetDownloadStatusTool),
            Box::new(RecommendSimilarTool),
            Box::new(ListDownloadsTool),
            Box::new(CheckAvailabilityTool),
            Box::new(GetWatchLinkTool),
        ])
    }

    /// Build a registry from an explicit tool list; later duplicates are dropped
    pub fn from_tools(tools: Vec<Box<dyn Tool>>) -> Self {
        let mut kept: Vec<Box<dyn Tool>> = Vec::with_capacity(tools.len());
        let mut index = HashMap::new();

        for tool in tools {
            if index.contains_key(tool.name()) {
                continue;
            }
            index.insert(tool.name(), kept.len());
            kept.push(tool);
        }

        let definitions = kept
            .iter()
            .map(|t| ToolDefinition::new(t.name(), t.description(), t.input_schema()))
            .collect();

        Self {
            tools: kept,
            index,
            definitions,
        }
    }

    /// Definitions sent to the model on every turn
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.index.get(name).map(|&i| self.tools[i].as_ref())
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool call; every failure comes back as an error output
    pub async fn execute(&self, call: &ToolCall, ctx: &ToolContext) -> ToolOutput {
        let Some(tool) = self.get(&call.name) else {
            return ToolOutput::error(format!("unknown tool: {}", call.name));
        };

        let output = tokio::select! {
            biased;
            _ = ctx.cancel_token().cancelled() => ToolOutput::error("cancelled"),
            result = tool.execute(&call.arguments, ctx) => match result {
                Ok(content) => ToolOutput::success(content),
                Err(e) => ToolOutput::error(e.to_string()),
            },
        };

        debug!("Tool {} ({}) finished, is_error={}", call.name, call.id, output.is_error);
        output
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.tool_names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Services;
    use crate::tools::Capability;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    fn ctx() -> ToolContext {
        ToolContext::new(Services::none(), CancellationToken::new())
    }

    #[test]
    fn test_standard_registry_order() {
        let registry = ToolRegistry::standard();
        assert_eq!(
            registry.tool_names(),
            vec![
                "search_movie",
                "get_movie_details",
                "download_movie",
                "get_download_status",
                "recommend_similar",
                "list_downloads",
                "check_availability",
                "get_watch_link",
            ]
        );
        assert_eq!(registry.len(), 8);
    }

    #[test]
    fn test_capabilities() {
        let registry = ToolRegistry::standard();
        let cap = |name: &str| registry.get(name).unwrap().capability();
        assert_eq!(cap("search_movie"), Capability::Metadata);
        assert_eq!(cap("get_movie_details"), Capability::Metadata);
        assert_eq!(cap("recommend_similar"), Capability::Metadata);
        assert_eq!(cap("download_movie"), Capability::Backend);
        assert_eq!(cap("get_download_status"), Capability::Backend);
        assert_eq!(cap("list_downloads"), Capability::Torrents);
        assert_eq!(cap("check_availability"), Capability::Library);
        assert_eq!(cap("get_watch_link"), Capability::Library);
    }

    #[test]
    fn test_definitions_are_stable() {
        let a = ToolRegistry::standard();
        let b = ToolRegistry::standard();
        assert_eq!(
            serde_json::to_string(a.definitions()).unwrap(),
            serde_json::to_string(b.definitions()).unwrap()
        );
    }

    #[test]
    fn test_from_tools_drops_duplicates() {
        let registry = ToolRegistry::from_tools(vec![Box::new(SearchMovieTool), Box::new(SearchMovieTool)]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.definitions().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::standard();
        let call = ToolCall::new("c1", "delete_everything", json!({}));
        let output = registry.execute(&call, &ctx()).await;
        assert!(output.is_error);
        assert_eq!(output.content, "unknown tool: delete_everything");
    }

    #[tokio::test]
    async fn test_missing_collaborator_is_error_output() {
        let registry = ToolRegistry::standard();
        let call = ToolCall::new("c1", "search_movie", json!({"query": "Alien"}));
        let output = registry.execute(&call, &ctx()).await;
        assert!(output.is_error);
        assert_eq!(output.content, "no metadata provider configured for searching");
    }

    #[tokio::test]
    async fn test_cancelled_context() {
        let registry = ToolRegistry::standard();
        let token = CancellationToken::new();
        token.cancel();
        let ctx = ToolContext::new(Services::none(), token);

        let call = ToolCall::new("c1", "list_downloads", json!({}));
        let output = registry.execute(&call, &ctx).await;
        assert!(output.is_error);
        assert_eq!(output.content, "cancelled");
    }
}
