//! Tool system for the media assistant
//!
//! Tools give the model access to the movie collaborators. Each agent request
//! gets a ToolContext holding whichever collaborators are configured.

mod args;
mod context;
mod downloads;
mod library;
mod movies;
mod registry;

pub use args::{ArgError, optional_int, optional_year, require_int, require_string};
pub use context::{Capability, MissingCapability, ToolContext};
pub use registry::ToolRegistry;

use async_trait::async_trait;
use serde_json::Value;

use crate::llm::ToolArguments;

/// A tool that can be called by the model
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (matches the model's tool call name)
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Collaborator the tool cannot run without
    fn capability(&self) -> Capability;

    /// JSON Schema for input parameters
    fn input_schema(&self) -> Value;

    /// Execute the tool, returning a serialized payload
    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> eyre::Result<String>;
}

/// Result from tool execution
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

pub use downloads::{DownloadMovieTool, GetDownloadStatusTool, ListDownloadsTool};
pub use library::{CheckAvailabilityTool, GetWatchLinkTool};
pub use movies::{GetMovieDetailsTool, RecommendSimilarTool, SearchMovieTool};
