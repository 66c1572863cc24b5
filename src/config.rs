use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use cinebot::agent::{AgentConfig, DEFAULT_MAX_ITERATIONS, SYSTEM_PROMPT};
use cinebot::llm::AnthropicConfig;
use cinebot::services::jellyfin::JellyfinConfig;
use cinebot::services::qbittorrent::QbittorrentConfig;
use cinebot::services::radarr::RadarrConfig;
use cinebot::services::tmdb::TmdbConfig;
use cinebot::services::{JellyfinClient, QbittorrentClient, RadarrClient, Services, TmdbClient};
use cinebot::session::UserId;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub agent: AgentSettings,
    pub access: AccessConfig,
    pub tmdb: Option<TmdbConfig>,
    pub radarr: Option<RadarrConfig>,
    pub qbittorrent: Option<QbittorrentConfig>,
    pub jellyfin: Option<JellyfinConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let defaults = AnthropicConfig::default();
        Self {
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            timeout_ms: defaults.timeout.as_millis() as u64,
            api_key_env: defaults.api_key_env,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub max_iterations: usize,
    /// Deadline for handling one message, model calls and tools included
    pub request_timeout_ms: u64,
    pub system_prompt: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            request_timeout_ms: 180_000,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Users allowed to talk to the bot; empty admits everyone
    pub allowed_users: Vec<UserId>,
    /// Identity used by the terminal chat
    pub local_user: UserId,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allowed_users: Vec::new(),
            local_user: 0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            agent: AgentSettings::default(),
            access: AccessConfig::default(),
            tmdb: None,
            radarr: None,
            qbittorrent: None,
            jellyfin: None,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn anthropic_config(&self) -> AnthropicConfig {
        AnthropicConfig {
            model: self.llm.model.clone(),
            max_tokens: self.llm.max_tokens,
            timeout: Duration::from_millis(self.llm.timeout_ms),
            api_key_env: self.llm.api_key_env.clone(),
        }
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            max_iterations: self.agent.max_iterations,
            system_prompt: self
                .agent
                .system_prompt
                .clone()
                .unwrap_or_else(|| SYSTEM_PROMPT.to_string()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.agent.request_timeout_ms)
    }

    /// Build the configured collaborators; unconfigured ones stay absent
    pub fn build_services(&self) -> Result<Services> {
        let mut services = Services::none();

        if let Some(tmdb) = &self.tmdb {
            services = services.with_metadata(Arc::new(TmdbClient::new(tmdb).context("TMDB client")?));
        }
        if let Some(radarr) = &self.radarr {
            services = services.with_backend(Arc::new(RadarrClient::new(radarr).context("Radarr client")?));
        }
        if let Some(qbittorrent) = &self.qbittorrent {
            services = services
                .with_torrents(Arc::new(QbittorrentClient::new(qbittorrent).context("qBittorrent client")?));
        }
        if let Some(jellyfin) = &self.jellyfin {
            services = services.with_library(Arc::new(JellyfinClient::new(jellyfin).context("Jellyfin client")?));
        }

        Ok(services)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.agent.max_iterations, 10);
        assert!(config.access.allowed_users.is_empty());
        assert!(config.tmdb.is_none());
        assert_eq!(config.agent_config().system_prompt, SYSTEM_PROMPT);
    }

    #[test]
    fn test_load_from_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
llm:
  model: claude-3-5-haiku-latest
agent:
  max_iterations: 4
access:
  allowed_users: [111, 222]
tmdb:
  api_key: abc
jellyfin:
  base_url: http://media.lan:8096
  api_key: xyz
"#
        )
        .unwrap();

        let config = Config::load(Some(&file.path().to_path_buf())).unwrap();
        assert_eq!(config.llm.model, "claude-3-5-haiku-latest");
        assert_eq!(config.llm.max_tokens, LlmConfig::default().max_tokens);
        assert_eq!(config.agent.max_iterations, 4);
        assert_eq!(config.access.allowed_users, vec![111, 222]);
        assert_eq!(config.tmdb.as_ref().unwrap().base_url, "https://api.themoviedb.org/3");
        assert!(config.radarr.is_none());

        let services = config.build_services().unwrap();
        assert_eq!(services.configured(), vec!["metadata", "library"]);
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let path = PathBuf::from("/nonexistent/cinebot.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_build_services_reports_missing_secret() {
        let config = Config {
            radarr: Some(RadarrConfig {
                api_key_env: "CINEBOT_TEST_RADARR_KEY_NEVER_SET".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.build_services().is_err());
    }

    #[test]
    fn test_anthropic_config_mapping() {
        let mut config = Config::default();
        config.llm.timeout_ms = 5_000;
        let anthropic = config.anthropic_config();
        assert_eq!(anthropic.timeout, Duration::from_millis(5_000));
        assert_eq!(anthropic.model, config.llm.model);
    }
}
