//! Library tools - check_availability, get_watch_link

use async_trait::async_trait;
use serde_json::{Value, json};

use super::args::require_string;
use super::{Capability, Tool, ToolContext};
use crate::llm::ToolArguments;

fn title_schema(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {
                "type": "string",
                "description": description
            }
        },
        "required": ["title"]
    })
}

pub struct CheckAvailabilityTool;

#[async_trait]
impl Tool for CheckAvailabilityTool {
    fn name(&self) -> &'static str {
        "check_availability"
    }

    fn description(&self) -> &'static str {
        "Check whether a movie is already in the media library and ready to watch."
    }

    fn capability(&self) -> Capability {
        Capability::Library
    }

    fn input_schema(&self) -> Value {
        title_schema("Movie title to look up in the library")
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> eyre::Result<String> {
        let library = ctx.library("checking availability")?;
        let title = require_string(args, "title")?;

        let available = library.is_available(&title).await?;
        Ok(json!({ "title": title, "available": available }).to_string())
    }
}

pub struct GetWatchLinkTool;

#[async_trait]
impl Tool for GetWatchLinkTool {
    fn name(&self) -> &'static str {
        "get_watch_link"
    }

    fn description(&self) -> &'static str {
        "Get a link to watch a movie that is in the media library."
    }

    fn capability(&self) -> Capability {
        Capability::Library
    }

    fn input_schema(&self) -> Value {
        title_schema("Movie title to get a watch link for")
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> eyre::Result<String> {
        let library = ctx.library("watch links")?;
        let title = require_string(args, "title")?;

        let url = library.get_link(&title).await?;
        Ok(json!({ "title": title, "url": url }).to_string())
    }
}
