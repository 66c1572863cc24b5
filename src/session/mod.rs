//! Session manager - one lazily created agent per user
//!
//! The user map is the only state shared between concurrent requests. It is
//! guarded by a short-lived lock that is never held while a session is being
//! built, so one user's slow construction never delays anyone else.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::error::{CinebotError, Result};

/// External user identity (chat user id)
pub type UserId = i64;

/// A session shared by every request from the same user
pub type SharedSession<S> = Arc<tokio::sync::Mutex<S>>;

/// Explicit teardown for resources a session owns
#[async_trait]
pub trait Release: Send + Sync {
    async fn release(&self);
}

struct SessionEntry<S> {
    session: SharedSession<S>,
    created_at: DateTime<Utc>,
}

/// Summary of a cached session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub user: UserId,
    pub created_at: DateTime<Utc>,
}

pub struct SessionManager<S> {
    sessions: Mutex<HashMap<UserId, SessionEntry<S>>>,
    allowed: HashSet<UserId>,
}

impl<S: Release> SessionManager<S> {
    /// Create a manager; an empty allow-list admits everyone
    pub fn new(allowed: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            allowed: allowed.into_iter().collect(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserId, SessionEntry<S>>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_allowed(&self, user: UserId) -> bool {
        self.allowed.is_empty() || self.allowed.contains(&user)
    }

    /// Cached session for `user`, if any
    pub fn get(&self, user: UserId) -> Option<SharedSession<S>> {
        self.lock().get(&user).map(|entry| entry.session.clone())
    }

    /// Return the user's session, building it with `factory` on first contact
    ///
    /// The factory runs outside the lock. If two requests for a new user race,
    /// the first to install wins and the other's session is released. A
    /// factory returning `None` caches nothing, so the next call retries.
    pub async fn get_or_create<F, Fut>(&self, user: UserId, factory: F) -> Result<SharedSession<S>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<S>>,
    {
        if let Some(session) = self.get(user) {
            return Ok(session);
        }

        debug!("Building session for user {}", user);
        let Some(built) = factory().await else {
            warn!("Session factory failed for user {}", user);
            return Err(CinebotError::Session(
                "could not create a session for this user".to_string(),
            ));
        };

        let (session, loser) = {
            let mut sessions = self.lock();
            match sessions.get(&user) {
                Some(existing) => (existing.session.clone(), Some(built)),
                None => {
                    let session = Arc::new(tokio::sync::Mutex::new(built));
                    sessions.insert(
                        user,
                        SessionEntry {
                            session: session.clone(),
                            created_at: Utc::now(),
                        },
                    );
                    (session, None)
                }
            }
        };

        match loser {
            Some(loser) => {
                debug!("Lost session race for user {}, releasing duplicate", user);
                loser.release().await;
            }
            None => info!("Created session for user {}", user),
        }

        Ok(session)
    }

    /// Drop the user's session; the next request builds a fresh one
    ///
    /// Waits for any in-flight request on the old session before releasing it.
    pub async fn reset(&self, user: UserId) -> bool {
        let removed = self.lock().remove(&user);
        match removed {
            Some(entry) => {
                info!("Reset session for user {}", user);
                entry.session.lock().await.release().await;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Cached sessions, oldest first
    pub fn sessions(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<SessionInfo> = self
            .lock()
            .iter()
            .map(|(user, entry)| SessionInfo {
                user: *user,
                created_at: entry.created_at,
            })
            .collect();
        infos.sort_by_key(|info| (info.created_at, info.user));
        infos
    }

    /// Release and drop every cached session
    pub async fn shutdown(&self) {
        let entries: Vec<SessionEntry<S>> = self.lock().drain().map(|(_, entry)| entry).collect();
        if entries.is_empty() {
            return;
        }

        info!("Releasing {} session(s)", entries.len());
        futures::future::join_all(entries.iter().map(|entry| async move {
            entry.session.lock().await.release().await;
        }))
        .await;
    }
}
