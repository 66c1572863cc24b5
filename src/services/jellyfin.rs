//! Jellyfin client - library lookups and watch links

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::MediaLibrary;
use crate::error::{CinebotError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JellyfinConfig {
    pub base_url: String,
    /// Address used in links handed to users, if different from `base_url`
    pub public_url: Option<String>,
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub timeout_ms: u64,
}

impl Default for JellyfinConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8096".to_string(),
            public_url: None,
            api_key: None,
            api_key_env: "JELLYFIN_API_KEY".to_string(),
            timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsPage {
    #[serde(default)]
    items: Vec<JellyfinItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct JellyfinItem {
    id: String,
    #[serde(default)]
    name: String,
}

/// Prefer an exact (case-insensitive) title match, else the server's top hit
fn best_match<'a>(items: &'a [JellyfinItem], title: &str) -> Option<&'a JellyfinItem> {
    items
        .iter()
        .find(|item| item.name.eq_ignore_ascii_case(title.trim()))
        .or_else(|| items.first())
}

pub struct JellyfinClient {
    client: Client,
    base_url: String,
    public_url: String,
    api_key: String,
}

impl JellyfinClient {
    pub fn new(config: &JellyfinConfig) -> Result<Self> {
        let api_key = match &config.api_key {
            Some(key) => key.clone(),
            None => std::env::var(&config.api_key_env)
                .map_err(|_| CinebotError::Config(format!("Jellyfin api key not set ({})", config.api_key_env)))?,
        };

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        let public_url = config
            .public_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| base_url.clone());

        Ok(Self {
            client,
            base_url,
            public_url,
            api_key,
        })
    }

    async fn search(&self, title: &str) -> Result<Vec<JellyfinItem>> {
        let url = format!("{}/Items", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("X-Emby-Token", &self.api_key)
            .query(&[
                ("searchTerm", title),
                ("IncludeItemTypes", "Movie"),
                ("Recursive", "true"),
                ("Limit", "5"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CinebotError::Tool(format!("Jellyfin returned {}: {}", status, body)));
        }

        let page: ItemsPage = response.json().await?;
        Ok(page.items)
    }

    fn details_link(&self, item_id: &str) -> String {
        format!("{}/web/index.html#!/details?id={}", self.public_url, item_id)
    }
}

#[async_trait]
impl MediaLibrary for JellyfinClient {
    async fn is_available(&self, title: &str) -> Result<bool> {
        Ok(!self.search(title).await?.is_empty())
    }

    async fn get_link(&self, title: &str) -> Result<String> {
        let items = self.search(title).await?;
        best_match(&items, title)
            .map(|item| self.details_link(&item.id))
            .ok_or_else(|| CinebotError::Tool(format!("'{}' is not in the library", title)))
    }
}
