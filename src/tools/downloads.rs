//! Download tools - download_movie, get_download_status, list_downloads

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

use super::args::{require_int, require_string};
use super::{Capability, Tool, ToolContext};
use crate::llm::ToolArguments;
use crate::services::{MediaItem, Torrent};

pub struct DownloadMovieTool;

#[async_trait]
impl Tool for DownloadMovieTool {
    fn name(&self) -> &'static str {
        "download_movie"
    }

    fn description(&self) -> &'static str {
        "Queue a movie for download. Use the TMDB id from search_movie. Returns the radarr_id to track progress with."
    }

    fn capability(&self) -> Capability {
        Capability::Backend
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tmdb_id": {
                    "type": "integer",
                    "description": "TMDB id of the movie"
                },
                "title": {
                    "type": "string",
                    "description": "Movie title"
                }
            },
            "required": ["tmdb_id", "title"]
        })
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> eyre::Result<String> {
        let backend = ctx.backend("downloading")?;
        let tmdb_id = require_int(args, "tmdb_id")?;
        let title = require_string(args, "title")?;

        let item = MediaItem::from_tmdb(tmdb_id, title.clone());
        let radarr_id = backend.add(&item).await?;

        Ok(json!({
            "status": "queued",
            "title": title,
            "tmdb_id": tmdb_id,
            "radarr_id": radarr_id
        })
        .to_string())
    }
}

pub struct GetDownloadStatusTool;

#[async_trait]
impl Tool for GetDownloadStatusTool {
    fn name(&self) -> &'static str {
        "get_download_status"
    }

    fn description(&self) -> &'static str {
        "Check whether a queued movie has finished downloading."
    }

    fn capability(&self) -> Capability {
        Capability::Backend
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "radarr_id": {
                    "type": "integer",
                    "description": "Id returned by download_movie"
                }
            },
            "required": ["radarr_id"]
        })
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> eyre::Result<String> {
        let backend = ctx.backend("download status")?;
        let radarr_id = require_int(args, "radarr_id")?;

        let status = backend.get_status(radarr_id).await?;
        Ok(serde_json::to_string(&status)?)
    }
}

/// Torrent progress as shown to the model
#[derive(Debug, Serialize)]
struct DownloadView {
    name: String,
    progress_percent: f64,
    speed_kib_s: u64,
    eta_secs: i64,
    state: String,
}

impl From<Torrent> for DownloadView {
    fn from(t: Torrent) -> Self {
        Self {
            name: t.name,
            progress_percent: (t.progress * 1000.0).round() / 10.0,
            speed_kib_s: t.download_speed / 1024,
            eta_secs: t.eta_secs,
            state: t.state,
        }
    }
}

pub struct ListDownloadsTool;

#[async_trait]
impl Tool for ListDownloadsTool {
    fn name(&self) -> &'static str {
        "list_downloads"
    }

    fn description(&self) -> &'static str {
        "List active torrents with progress, speed and estimated time remaining."
    }

    fn capability(&self) -> Capability {
        Capability::Torrents
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _args: &ToolArguments, ctx: &ToolContext) -> eyre::Result<String> {
        let torrents = ctx.torrents("listing downloads")?;

        let views: Vec<DownloadView> = torrents.list().await?.into_iter().map(Into::into).collect();
        Ok(serde_json::to_string(&views)?)
    }
}
