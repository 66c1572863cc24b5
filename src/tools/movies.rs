//! Metadata tools - search_movie, get_movie_details, recommend_similar

use async_trait::async_trait;
use serde_json::{Value, json};

use super::args::{optional_year, require_int, require_string};
use super::{Capability, Tool, ToolContext};
use crate::llm::ToolArguments;

pub struct SearchMovieTool;

#[async_trait]
impl Tool for SearchMovieTool {
    fn name(&self) -> &'static str {
        "search_movie"
    }

    fn description(&self) -> &'static str {
        "Search for movies by title. Returns matching movies with their TMDB id, title, year, overview and rating."
    }

    fn capability(&self) -> Capability {
        Capability::Metadata
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Movie title or keywords to search for"
                },
                "year": {
                    "type": "integer",
                    "description": "Optional release year to narrow the search"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> eyre::Result<String> {
        let metadata = ctx.metadata("searching")?;
        let query = require_string(args, "query")?;
        let year = optional_year(args, "year")?;

        let movies = metadata.search_movies(&query, year).await?;
        Ok(serde_json::to_string(&movies)?)
    }
}

pub struct GetMovieDetailsTool;

#[async_trait]
impl Tool for GetMovieDetailsTool {
    fn name(&self) -> &'static str {
        "get_movie_details"
    }

    fn description(&self) -> &'static str {
        "Get full details for a movie: runtime, genres, overview, rating and IMDb id."
    }

    fn capability(&self) -> Capability {
        Capability::Metadata
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tmdb_id": {
                    "type": "integer",
                    "description": "TMDB id of the movie"
                }
            },
            "required": ["tmdb_id"]
        })
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> eyre::Result<String> {
        let metadata = ctx.metadata("movie details")?;
        let id = require_int(args, "tmdb_id")?;

        let details = metadata.get_movie(id).await?;
        Ok(serde_json::to_string(&details)?)
    }
}

pub struct RecommendSimilarTool;

#[async_trait]
impl Tool for RecommendSimilarTool {
    fn name(&self) -> &'static str {
        "recommend_similar"
    }

    fn description(&self) -> &'static str {
        "Recommend movies similar to the given movie."
    }

    fn capability(&self) -> Capability {
        Capability::Metadata
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tmdb_id": {
                    "type": "integer",
                    "description": "TMDB id of the movie to base recommendations on"
                }
            },
            "required": ["tmdb_id"]
        })
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> eyre::Result<String> {
        let metadata = ctx.metadata("recommendations")?;
        let id = require_int(args, "tmdb_id")?;

        let movies = metadata.get_recommendations(id).await?;
        Ok(serde_json::to_string(&movies)?)
    }
}
