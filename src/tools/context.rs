//! Tool execution context - the collaborators one agent's tools may reach

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::services::{MediaBackend, MediaLibrary, MetadataProvider, Services, TorrentClient};

/// Capability a tool depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Metadata,
    Backend,
    Torrents,
    Library,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Metadata => "metadata provider",
            Capability::Backend => "media backend",
            Capability::Torrents => "torrent client",
            Capability::Library => "media library server",
        };
        f.write_str(name)
    }
}

/// A required collaborator was never configured
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no {capability} configured for {action}")]
pub struct MissingCapability {
    pub capability: Capability,
    pub action: &'static str,
}

/// Execution context for tools - scoped to one request of one agent
#[derive(Clone)]
pub struct ToolContext {
    services: Services,
    cancel: CancellationToken,
}

impl ToolContext {
    pub fn new(services: Services, cancel: CancellationToken) -> Self {
        Self { services, cancel }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Metadata => self.services.metadata.is_some(),
            Capability::Backend => self.services.backend.is_some(),
            Capability::Torrents => self.services.torrents.is_some(),
            Capability::Library => self.services.library.is_some(),
        }
    }

    fn missing(capability: Capability, action: &'static str) -> MissingCapability {
        MissingCapability { capability, action }
    }

    pub fn metadata(&self, action: &'static str) -> Result<&Arc<dyn MetadataProvider>, MissingCapability> {
        self.services
            .metadata
            .as_ref()
            .ok_or_else(|| Self::missing(Capability::Metadata, action))
    }

    pub fn backend(&self, action: &'static str) -> Result<&Arc<dyn MediaBackend>, MissingCapability> {
        self.services
            .backend
            .as_ref()
            .ok_or_else(|| Self::missing(Capability::Backend, action))
    }

    pub fn torrents(&self, action: &'static str) -> Result<&Arc<dyn TorrentClient>, MissingCapability> {
        self.services
            .torrents
            .as_ref()
            .ok_or_else(|| Self::missing(Capability::Torrents, action))
    }

    pub fn library(&self, action: &'static str) -> Result<&Arc<dyn MediaLibrary>, MissingCapability> {
        self.services
            .library
            .as_ref()
            .ok_or_else(|| Self::missing(Capability::Library, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_capability_message() {
        let ctx = ToolContext::new(Services::none(), CancellationToken::new());
        let err = ctx.backend("downloading").err().unwrap();
        assert_eq!(err.to_string(), "no media backend configured for downloading");
        assert!(!ctx.has(Capability::Backend));
    }

    #[test]
    fn test_capability_display() {
        assert_eq!(Capability::Metadata.to_string(), "metadata provider");
        assert_eq!(Capability::Torrents.to_string(), "torrent client");
        assert_eq!(Capability::Library.to_string(), "media library server");
    }
}
