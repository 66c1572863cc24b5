//! TMDB v3 client - movie search, details, and recommendations

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{MetadataProvider, MovieDetails, MovieSummary};
use crate::error::{CinebotError, Result};

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Maximum results returned to the model per query
const MAX_RESULTS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub timeout_ms: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            api_key_env: "TMDB_API_KEY".to_string(),
            timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    overview: String,
    #[serde(default)]
    vote_average: f64,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    #[serde(default)]
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    name: String,
}

/// Year component of a `YYYY-MM-DD` release date
fn release_year(date: Option<&str>) -> Option<i32> {
    date.and_then(|d| d.get(..4)).and_then(|y| y.parse().ok())
}

impl From<TmdbMovie> for MovieSummary {
    fn from(movie: TmdbMovie) -> Self {
        Self {
            id: movie.id,
            year: release_year(movie.release_date.as_deref()),
            title: movie.title,
            overview: movie.overview,
            rating: movie.vote_average,
        }
    }
}

impl From<TmdbMovie> for MovieDetails {
    fn from(movie: TmdbMovie) -> Self {
        Self {
            id: movie.id,
            year: release_year(movie.release_date.as_deref()),
            title: movie.title,
            overview: movie.overview,
            rating: movie.vote_average,
            runtime_minutes: movie.runtime,
            genres: movie.genres.into_iter().map(|g| g.name).collect(),
            imdb_id: movie.imdb_id.filter(|id| !id.is_empty()),
        }
    }
}

pub struct TmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Result<Self> {
        let api_key = match &config.api_key {
            Some(key) => key.clone(),
            None => std::env::var(&config.api_key_env)
                .map_err(|_| CinebotError::Config(format!("TMDB api key not set ({})", config.api_key_env)))?,
        };

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("TMDB GET {}", path);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CinebotError::Tool(format!("TMDB returned {}: {}", status, body)));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn search_movies(&self, query: &str, year: Option<i32>) -> Result<Vec<MovieSummary>> {
        let mut params = vec![("query", query.to_string())];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }

        let page: SearchPage = self.get("/search/movie", &params).await?;
        Ok(page.results.into_iter().take(MAX_RESULTS).map(Into::into).collect())
    }

    async fn get_movie(&self, id: i64) -> Result<MovieDetails> {
        let movie: TmdbMovie = self.get(&format!("/movie/{}", id), &[]).await?;
        Ok(movie.into())
    }

    async fn get_recommendations(&self, id: i64) -> Result<Vec<MovieSummary>> {
        let page: SearchPage = self.get(&format!("/movie/{}/recommendations", id), &[]).await?;
        Ok(page.results.into_iter().take(MAX_RESULTS).map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_year() {
        assert_eq!(release_year(Some("2010-07-15")), Some(2010));
        assert_eq!(release_year(Some("")), None);
        assert_eq!(release_year(None), None);
    }

    #[test]
    fn test_details_from_tmdb_json() {
        let movie: TmdbMovie = serde_json::from_str(
            r#"{
                "id": 27205,
                "title": "Inception",
                "release_date": "2010-07-15",
                "overview": "Cobb steals secrets.",
                "vote_average": 8.4,
                "runtime": 148,
                "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
                "imdb_id": "tt1375666"
            }"#,
        )
        .unwrap();

        let details: MovieDetails = movie.into();
        assert_eq!(details.year, Some(2010));
        assert_eq!(details.runtime_minutes, Some(148));
        assert_eq!(details.genres, vec!["Action", "Science Fiction"]);
        assert_eq!(details.imdb_id.as_deref(), Some("tt1375666"));
    }

    #[test]
    fn test_search_page_tolerates_sparse_entries() {
        let page: SearchPage = serde_json::from_str(r#"{"results": [{"id": 1}]}"#).unwrap();
        let summary: MovieSummary = page.results.into_iter().next().unwrap().into();
        assert_eq!(summary.id, 1);
        assert_eq!(summary.year, None);
    }

    #[test]
    fn test_client_with_inline_key() {
        let config = TmdbConfig {
            api_key: Some("abc".to_string()),
            base_url: "http://localhost:9999/3/".to_string(),
            ..Default::default()
        };
        let client = TmdbClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:9999/3");
    }

    #[test]
    fn test_client_missing_key() {
        let config = TmdbConfig {
            api_key_env: "CINEBOT_TEST_TMDB_KEY_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(matches!(TmdbClient::new(&config), Err(CinebotError::Config(_))));
    }
}
