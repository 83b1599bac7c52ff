//! Session store: access token, refresh token, role and username.
//!
//! One writer (the auth flows) replaces or clears the whole record; every
//! other component only reads. Reads never fail and never block on I/O.

mod storage;

pub use storage::{FileStorage, MemoryStorage, SessionStorage};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub role: Option<Role>,
    pub username: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Session::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session storage is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct SessionStore {
    current: RwLock<Session>,
    storage: Box<dyn SessionStorage>,
}

impl SessionStore {
    /// Open a store over durable storage, restoring whatever was persisted.
    pub fn open(storage: impl SessionStorage + 'static) -> Self {
        let restored = match storage.load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Discarding unreadable session: {}", e);
                Session::default()
            }
        };

        Self {
            current: RwLock::new(restored),
            storage: Box::new(storage),
        }
    }

    pub fn in_memory() -> Self {
        Self::open(MemoryStorage::new())
    }

    pub fn get(&self) -> Session {
        self.current.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .access_token
            .clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.current.read().unwrap_or_else(|e| e.into_inner()).role
    }

    /// Replace the whole session. The in-memory copy is updated even when
    /// persisting fails, so the running process stays consistent.
    pub fn set(&self, tokens: Tokens, role: Role, username: impl Into<String>) -> Result<(), SessionError> {
        let session = Session {
            access_token: Some(tokens.access),
            refresh_token: Some(tokens.refresh),
            role: Some(role),
            username: Some(username.into()),
        };

        *self.current.write().unwrap_or_else(|e| e.into_inner()) = session.clone();
        tracing::info!(
            "Session started for {} ({})",
            session.username.as_deref().unwrap_or("-"),
            role
        );

        self.storage.save(&session).map_err(|e| {
            tracing::error!("Failed to persist session: {}", e);
            e
        })
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        *self.current.write().unwrap_or_else(|e| e.into_inner()) = Session::default();
        tracing::debug!("Session cleared");

        self.storage.remove().map_err(|e| {
            tracing::error!("Failed to remove persisted session: {}", e);
            e
        })
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.get();
        f.debug_struct("SessionStore")
            .field("authenticated", &session.is_authenticated())
            .field("role", &session.role)
            .field("username", &session.username)
            .finish()
    }
}
