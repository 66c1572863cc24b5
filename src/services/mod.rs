//! Capability collaborators - metadata, download backend, torrents, library
//!
//! Each capability is a trait so the agent can run against real REST clients
//! or test doubles. Any of them may be absent at runtime.

pub mod jellyfin;
pub mod qbittorrent;
pub mod radarr;
pub mod tmdb;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use jellyfin::JellyfinClient;
pub use qbittorrent::QbittorrentClient;
pub use radarr::RadarrClient;
pub use tmdb::TmdbClient;

/// A movie as returned by search and recommendation queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub overview: String,
    pub rating: f64,
}

/// Full details of a single movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetails {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub overview: String,
    pub rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_minutes: Option<u32>,
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
}

/// An item handed to the media backend for downloading
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub metadata: HashMap<String, String>,
}

impl MediaItem {
    /// Metadata key carrying the TMDB id
    pub const TMDB_ID: &'static str = "tmdbId";

    /// Build an item for a TMDB movie
    pub fn from_tmdb(tmdb_id: i64, title: impl Into<String>) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(Self::TMDB_ID.to_string(), tmdb_id.to_string());
        Self {
            title: title.into(),
            year: None,
            metadata,
        }
    }

    /// The TMDB id, if present and numeric
    pub fn tmdb_id(&self) -> Option<i64> {
        self.metadata.get(Self::TMDB_ID).and_then(|v| v.parse().ok())
    }
}

/// Download state of an item known to the media backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadStatus {
    pub id: i64,
    pub title: String,
    pub monitored: bool,
    pub downloaded: bool,
    pub size_on_disk: u64,
    pub status: String,
}

/// A torrent as reported by the torrent client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Torrent {
    pub name: String,
    /// Completion fraction in `0.0..=1.0`
    pub progress: f64,
    /// Bytes per second
    pub download_speed: u64,
    /// Seconds until completion, as reported by the client
    pub eta_secs: i64,
    pub state: String,
}

/// Movie metadata lookups (TMDB)
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn search_movies(&self, query: &str, year: Option<i32>) -> Result<Vec<MovieSummary>>;

    async fn get_movie(&self, id: i64) -> Result<MovieDetails>;

    async fn get_recommendations(&self, id: i64) -> Result<Vec<MovieSummary>>;

    /// Release any session held with the remote service
    async fn close(&self) {}
}

/// Download manager that acquires movies (Radarr)
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Queue an item, returning the backend's id for it
    async fn add(&self, item: &MediaItem) -> Result<i64>;

    async fn get_status(&self, item_id: i64) -> Result<DownloadStatus>;

    async fn close(&self) {}
}

/// Torrent client progress reporting (qBittorrent)
#[async_trait]
pub trait TorrentClient: Send + Sync {
    async fn list(&self) -> Result<Vec<Torrent>>;

    async fn close(&self) {}
}

/// Media library server the user watches from (Jellyfin)
#[async_trait]
pub trait MediaLibrary: Send + Sync {
    async fn is_available(&self, title: &str) -> Result<bool>;

    async fn get_link(&self, title: &str) -> Result<String>;

    async fn close(&self) {}
}

/// The optional collaborators an agent's tools can reach
#[derive(Clone, Default)]
pub struct Services {
    pub metadata: Option<Arc<dyn MetadataProvider>>,
    pub backend: Option<Arc<dyn MediaBackend>>,
    pub torrents: Option<Arc<dyn TorrentClient>>,
    pub library: Option<Arc<dyn MediaLibrary>>,
}

impl Services {
    /// No collaborators configured
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_backend(mut self, backend: Arc<dyn MediaBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_torrents(mut self, torrents: Arc<dyn TorrentClient>) -> Self {
        self.torrents = Some(torrents);
        self
    }

    pub fn with_library(mut self, library: Arc<dyn MediaLibrary>) -> Self {
        self.library = Some(library);
        self
    }

    /// Names of the configured collaborators, for logging
    pub fn configured(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.metadata.is_some() {
            names.push("metadata");
        }
        if self.backend.is_some() {
            names.push("backend");
        }
        if self.torrents.is_some() {
            names.push("torrents");
        }
        if self.library.is_some() {
            names.push("library");
        }
        names
    }

    /// Close every configured collaborator
    pub async fn close(&self) {
        if let Some(metadata) = &self.metadata {
            metadata.close().await;
        }
        if let Some(backend) = &self.backend {
            backend.close().await;
        }
        if let Some(torrents) = &self.torrents {
            torrents.close().await;
        }
        if let Some(library) = &self.library {
            library.close().await;
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").field("configured", &self.configured()).finish()
    }
}
