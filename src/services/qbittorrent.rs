//! qBittorrent Web API v2 client - lists torrents with progress
//!
//! Authenticates with a session cookie on first use and logs out on close.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{Torrent, TorrentClient};
use crate::error::{CinebotError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QbittorrentConfig {
    pub base_url: String,
    pub username: String,
    pub password: Option<String>,
    pub password_env: String,
    pub timeout_ms: u64,
}

impl Default for QbittorrentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            username: "admin".to_string(),
            password: None,
            password_env: "QBITTORRENT_PASSWORD".to_string(),
            timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QbTorrent {
    #[serde(default)]
    name: String,
    #[serde(default)]
    progress: f64,
    #[serde(default)]
    dlspeed: u64,
    #[serde(default)]
    eta: i64,
    #[serde(default)]
    state: String,
}

impl From<QbTorrent> for Torrent {
    fn from(t: QbTorrent) -> Self {
        Self {
            name: t.name,
            progress: t.progress,
            download_speed: t.dlspeed,
            eta_secs: t.eta,
            state: t.state,
        }
    }
}

pub struct QbittorrentClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    logged_in: Mutex<bool>,
}

impl QbittorrentClient {
    pub fn new(config: &QbittorrentConfig) -> Result<Self> {
        let password = match &config.password {
            Some(password) => password.clone(),
            None => std::env::var(&config.password_env).map_err(|_| {
                CinebotError::Config(format!("qBittorrent password not set ({})", config.password_env))
            })?,
        };

        let client = Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password,
            logged_in: Mutex::new(false),
        })
    }

    async fn login(&self) -> Result<()> {
        let mut logged_in = self.logged_in.lock().await;
        if *logged_in {
            return Ok(());
        }

        let url = format!("{}/api/v2/auth/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Referer", &self.base_url)
            .form(&[("username", self.username.as_str()), ("password", self.password.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() || body.trim() != "Ok." {
            return Err(CinebotError::Tool(format!("qBittorrent login failed ({}): {}", status, body)));
        }

        debug!("qBittorrent session established");
        *logged_in = true;
        Ok(())
    }

    async fn fetch_torrents(&self) -> Result<std::result::Result<Vec<QbTorrent>, StatusCode>> {
        let url = format!("{}/api/v2/torrents/info", self.base_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            return Ok(Err(status));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CinebotError::Tool(format!("qBittorrent returned {}: {}", status, body)));
        }
        Ok(Ok(response.json().await?))
    }
}

#[async_trait]
impl TorrentClient for QbittorrentClient {
    async fn list(&self) -> Result<Vec<Torrent>> {
        self.login().await?;

        let torrents = match self.fetch_torrents().await? {
            Ok(torrents) => torrents,
            Err(_) => {
                // Session cookie expired; log in again once.
                *self.logged_in.lock().await = false;
                self.login().await?;
                self.fetch_torrents()
                    .await?
                    .map_err(|status| CinebotError::Tool(format!("qBittorrent returned {}", status)))?
            }
        };

        Ok(torrents.into_iter().map(Into::into).collect())
    }

    async fn close(&self) {
        let mut logged_in = self.logged_in.lock().await;
        if !*logged_in {
            return;
        }

        let url = format!("{}/api/v2/auth/logout", self.base_url);
        if let Err(e) = self.client.post(&url).send().await {
            warn!("qBittorrent logout failed: {}", e);
        }
        *logged_in = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torrent_from_api_json() {
        let raw: Vec<QbTorrent> = serde_json::from_str(
            r#"[{"name": "Inception.2010.1080p", "progress": 0.42, "dlspeed": 1048576, "eta": 600, "state": "downloading", "hash": "abc"}]"#,
        )
        .unwrap();
        let torrent: Torrent = raw.into_iter().next().unwrap().into();

        assert_eq!(torrent.name, "Inception.2010.1080p");
        assert!((torrent.progress - 0.42).abs() < f64::EPSILON);
        assert_eq!(torrent.download_speed, 1_048_576);
        assert_eq!(torrent.eta_secs, 600);
    }

    #[tokio::test]
    async fn test_close_without_login_is_noop() {
        let client = QbittorrentClient::new(&QbittorrentConfig {
            password: Some("secret".to_string()),
            ..Default::default()
        })
        .unwrap();
        client.close().await;
        assert!(!*client.logged_in.lock().await);
    }
}
