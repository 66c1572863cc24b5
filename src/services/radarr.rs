//! Radarr v3 client - queues movies for download and reports their state

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{DownloadStatus, MediaBackend, MediaItem};
use crate::error::{CinebotError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarrConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub quality_profile_id: i64,
    pub root_folder: String,
    pub timeout_ms: u64,
}

impl Default for RadarrConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7878".to_string(),
            api_key: None,
            api_key_env: "RADARR_API_KEY".to_string(),
            quality_profile_id: 1,
            root_folder: "/movies".to_string(),
            timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RadarrMovie {
    id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    monitored: bool,
    #[serde(default)]
    has_file: bool,
    #[serde(default)]
    size_on_disk: u64,
    #[serde(default)]
    status: String,
}

impl From<RadarrMovie> for DownloadStatus {
    fn from(movie: RadarrMovie) -> Self {
        Self {
            id: movie.id,
            title: movie.title,
            monitored: movie.monitored,
            downloaded: movie.has_file,
            size_on_disk: movie.size_on_disk,
            status: movie.status,
        }
    }
}

pub struct RadarrClient {
    client: Client,
    base_url: String,
    api_key: String,
    quality_profile_id: i64,
    root_folder: String,
}

impl RadarrClient {
    pub fn new(config: &RadarrConfig) -> Result<Self> {
        let api_key = match &config.api_key {
            Some(key) => key.clone(),
            None => std::env::var(&config.api_key_env)
                .map_err(|_| CinebotError::Config(format!("Radarr api key not set ({})", config.api_key_env)))?,
        };

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            quality_profile_id: config.quality_profile_id,
            root_folder: config.root_folder.clone(),
        })
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("X-Api-Key", &self.api_key)
    }

    /// Body for `POST /api/v3/movie`
    fn add_body(&self, item: &MediaItem, tmdb_id: i64) -> Value {
        let mut body = json!({
            "title": item.title,
            "tmdbId": tmdb_id,
            "qualityProfileId": self.quality_profile_id,
            "rootFolderPath": self.root_folder,
            "monitored": true,
            "addOptions": { "searchForMovie": true }
        });
        if let Some(year) = item.year {
            body["year"] = json!(year);
        }
        body
    }

    async fn send(&self, builder: RequestBuilder) -> Result<RadarrMovie> {
        let response = self.request(builder).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CinebotError::Tool(format!("Radarr returned {}: {}", status, body)));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl MediaBackend for RadarrClient {
    async fn add(&self, item: &MediaItem) -> Result<i64> {
        let tmdb_id = item
            .tmdb_id()
            .ok_or_else(|| CinebotError::Tool(format!("'{}' has no tmdbId", item.title)))?;

        let url = format!("{}/api/v3/movie", self.base_url);
        let movie = self.send(self.client.post(&url).json(&self.add_body(item, tmdb_id))).await?;

        info!("Radarr queued '{}' (tmdb {}) as {}", item.title, tmdb_id, movie.id);
        Ok(movie.id)
    }

    async fn get_status(&self, item_id: i64) -> Result<DownloadStatus> {
        debug!("Radarr status for {}", item_id);
        let url = format!("{}/api/v3/movie/{}", self.base_url, item_id);
        Ok(self.send(self.client.get(&url)).await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RadarrClient {
        RadarrClient::new(&RadarrConfig {
            api_key: Some("key".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_add_body() {
        let mut item = MediaItem::from_tmdb(27205, "Inception");
        item.year = Some(2010);
        let body = client().add_body(&item, 27205);

        assert_eq!(body["tmdbId"], 27205);
        assert_eq!(body["title"], "Inception");
        assert_eq!(body["year"], 2010);
        assert_eq!(body["rootFolderPath"], "/movies");
        assert_eq!(body["addOptions"]["searchForMovie"], true);
    }

    #[test]
    fn test_status_from_radarr_json() {
        let movie: RadarrMovie = serde_json::from_str(
            r#"{"id": 7, "title": "Inception", "monitored": true, "hasFile": false, "sizeOnDisk": 0, "status": "released"}"#,
        )
        .unwrap();
        let status: DownloadStatus = movie.into();
        assert_eq!(status.id, 7);
        assert!(status.monitored);
        assert!(!status.downloaded);
    }

    #[tokio::test]
    async fn test_add_requires_tmdb_id() {
        let item = MediaItem {
            title: "Nameless".to_string(),
            ..Default::default()
        };
        let err = client().add(&item).await.unwrap_err();
        assert!(err.to_string().contains("tmdbId"));
    }
}
