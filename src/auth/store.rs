//! Session Persistence
//!
//! Durable key-value storage for the session so it survives restarts.
//! The file store keeps a single JSON document in the data directory;
//! the memory store backs tests.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::roles::UserSnapshot;
use super::AuthError;

/// Serialized session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: Option<UserSnapshot>,
}

/// Durable storage for the session
pub trait SessionStore: Send + Sync {
    /// Load the persisted session, if any
    fn load(&self) -> Result<Option<PersistedSession>, AuthError>;

    /// Persist the session, replacing any prior state
    fn save(&self, session: &PersistedSession) -> Result<(), AuthError>;

    /// Remove all persisted state
    fn clear(&self) -> Result<(), AuthError>;
}

/// File-backed session store (one JSON file)
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at the given directory
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join("session.json"),
        }
    }

    /// Path of the session file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, AuthError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        match serde_json::from_str(&content) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // A corrupt session file is not fatal, the user just
                // has to log in again.
                tracing::warn!("Discarding unreadable session file: {}", e);
                let _ = std::fs::remove_file(&self.path);
                Ok(None)
            }
        }
    }

    fn save(&self, session: &PersistedSession) -> Result<(), AuthError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AuthError::Storage(e.to_string()))?;
        }

        let content =
            serde_json::to_string_pretty(session).map_err(|e| AuthError::Storage(e.to_string()))?;
        std::fs::write(&self.path, content).map_err(|e| AuthError::Storage(e.to_string()))
    }

    fn clear(&self) -> Result<(), AuthError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| AuthError::Storage(e.to_string()))?;
        }
        Ok(())
    }
}

/// In-memory session store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Option<PersistedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<PersistedSession>, AuthError> {
        Ok(self.inner.lock().unwrap().clone())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), AuthError> {
        *self.inner.lock().unwrap() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.inner.lock().unwrap() = None;
        Ok(())
    }
}
