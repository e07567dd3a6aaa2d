//! Authentication and Session Management
//!
//! This module owns the access/refresh token pair and the
//! authenticated-user snapshot:
//! - [`SessionManager`]: login, logout, single-flight token refresh
//! - [`SessionStore`]: durable persistence so the session survives restarts
//! - [`UserSnapshot`] / [`RoleRef`]: role and permission matching

mod roles;
mod session;
mod store;

pub use roles::{Permission, RoleRef, UserSnapshot};
pub use session::SessionManager;
pub use store::{FileSessionStore, MemorySessionStore, PersistedSession, SessionStore};

use thiserror::Error;

/// Errors from authentication operations
#[derive(Debug, Error)]
pub enum AuthError {
    /// Credentials rejected by the server; session unchanged
    #[error("Authentication failed: {0}")]
    InvalidCredentials(String),

    /// Refresh token missing or rejected; session has been cleared
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// Session persistence failed
    #[error("Session storage error: {0}")]
    Storage(String),

    /// Network-level failure talking to the auth endpoints
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),
}
