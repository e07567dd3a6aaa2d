//! Session Manager
//!
//! Owns the current session (token pair + user snapshot) and makes token
//! expiry transparent to the HTTP transport. All mutation goes through
//! this type; callers only read.
//!
//! Refresh is single-flight: when several requests hit a 401 at the same
//! time, one refresh executes and the others reuse its result.

use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tokio::sync::Mutex;

use super::roles::UserSnapshot;
use super::store::{PersistedSession, SessionStore};
use super::AuthError;
use crate::api::dto::ApiEnvelope;

/// Manages the authenticated session against the backend auth endpoints
pub struct SessionManager {
    http: reqwest::Client,
    base_url: String,
    store: Box<dyn SessionStore>,
    state: RwLock<SessionState>,
    /// Serializes refresh attempts across concurrent 401 handlers
    refresh_lock: Mutex<()>,
}

#[derive(Default)]
struct SessionState {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user: Option<UserSnapshot>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPair {
    access_token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    user: Option<UserSnapshot>,
}

impl SessionManager {
    /// Create a session manager talking to the given API base URL
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: std::time::Duration,
        store: Box<dyn SessionStore>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.into(),
            store,
            state: RwLock::new(SessionState::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Restore a persisted session from the store, if one exists.
    /// Returns whether a session was restored.
    pub fn restore(&self) -> Result<bool, AuthError> {
        match self.store.load()? {
            Some(persisted) => {
                let mut state = self.state.write().unwrap();
                state.access_token = Some(persisted.access_token);
                state.refresh_token = Some(persisted.refresh_token);
                state.user = persisted.user;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Whether a token and user snapshot are both present
    pub fn is_authenticated(&self) -> bool {
        let state = self.state.read().unwrap();
        state.access_token.is_some() && state.user.is_some()
    }

    /// Current access token, if any
    pub fn access_token(&self) -> Option<String> {
        self.state.read().unwrap().access_token.clone()
    }

    /// Current refresh token, if any
    pub fn refresh_token(&self) -> Option<String> {
        self.state.read().unwrap().refresh_token.clone()
    }

    /// Snapshot of the authenticated user, if any
    pub fn user(&self) -> Option<UserSnapshot> {
        self.state.read().unwrap().user.clone()
    }

    /// Authenticate with username and password.
    ///
    /// Stores the token pair, then fetches the full user profile. On any
    /// failure the prior session state is left untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserSnapshot, AuthError> {
        let response = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        if !response.status().is_success() {
            let message = envelope_message(response).await;
            return Err(AuthError::InvalidCredentials(message));
        }

        let envelope: ApiEnvelope<TokenPair> = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        let tokens = envelope
            .data
            .ok_or_else(|| AuthError::Decode("login response missing token data".into()))?;

        let user = self.fetch_current_user(&tokens.access_token).await?;

        {
            let mut state = self.state.write().unwrap();
            state.access_token = Some(tokens.access_token.clone());
            state.refresh_token = Some(tokens.refresh_token.clone());
            state.user = Some(user.clone());
        }
        self.persist()?;

        tracing::info!(username = %user.username, "Logged in");
        Ok(user)
    }

    /// End the session.
    ///
    /// The server-side logout is best-effort; local state and persisted
    /// storage are cleared unconditionally.
    pub async fn logout(&self) {
        let token = self.access_token();

        let mut request = self.http.post(format!("{}/auth/logout", self.base_url));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Err(e) = request.send().await {
            tracing::warn!("Server logout failed: {}", e);
        }

        self.clear();
        tracing::info!("Logged out");
    }

    /// Exchange the stored refresh token for a new token pair.
    ///
    /// On failure the session is cleared and the caller must log in again.
    pub async fn refresh(&self) -> Result<String, AuthError> {
        let _guard = self.refresh_lock.lock().await;
        self.do_refresh().await
    }

    /// Single-flight refresh for 401 handlers.
    ///
    /// `stale_token` is the access token the failed request carried. If
    /// another flow already rotated the token while this caller waited
    /// for the lock, the fresh token is returned without a second
    /// refresh round-trip.
    pub async fn refresh_after(&self, stale_token: Option<&str>) -> Result<String, AuthError> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.access_token() {
            if Some(current.as_str()) != stale_token {
                return Ok(current);
            }
        }

        self.do_refresh().await
    }

    async fn do_refresh(&self) -> Result<String, AuthError> {
        let refresh_token = match self.refresh_token() {
            Some(token) => token,
            None => {
                self.clear();
                return Err(AuthError::RefreshFailed("no refresh token available".into()));
            }
        };

        let result = self.exchange_refresh_token(&refresh_token).await;

        match result {
            Ok(access_token) => Ok(access_token),
            Err(e) => {
                tracing::warn!("Token refresh failed, clearing session: {}", e);
                self.clear();
                Err(e)
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<String, AuthError> {
        let response = self
            .http
            .post(format!("{}/auth/refresh", self.base_url))
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            let message = envelope_message(response).await;
            return Err(AuthError::RefreshFailed(message));
        }

        let envelope: ApiEnvelope<RefreshResponse> = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        let refreshed = envelope
            .data
            .ok_or_else(|| AuthError::Decode("refresh response missing token data".into()))?;

        {
            let mut state = self.state.write().unwrap();
            state.access_token = Some(refreshed.access_token.clone());
            state.refresh_token = Some(refreshed.refresh_token);
            if refreshed.user.is_some() {
                state.user = refreshed.user;
            }
        }
        self.persist()?;

        tracing::debug!("Access token refreshed");
        Ok(refreshed.access_token)
    }

    async fn fetch_current_user(&self, access_token: &str) -> Result<UserSnapshot, AuthError> {
        let response = self
            .http
            .get(format!("{}/auth/me", self.base_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AuthError::Decode(format!(
                "profile fetch failed with HTTP {}",
                response.status()
            )));
        }

        let envelope: ApiEnvelope<UserSnapshot> = response
            .json()
            .await
            .map_err(|e| AuthError::Decode(e.to_string()))?;
        envelope
            .data
            .ok_or_else(|| AuthError::Decode("profile response missing user data".into()))
    }

    fn persist(&self) -> Result<(), AuthError> {
        let persisted = {
            let state = self.state.read().unwrap();
            match (&state.access_token, &state.refresh_token) {
                (Some(access), Some(refresh)) => PersistedSession {
                    access_token: access.clone(),
                    refresh_token: refresh.clone(),
                    user: state.user.clone(),
                },
                _ => return Ok(()),
            }
        };
        self.store.save(&persisted)
    }

    fn clear(&self) {
        {
            let mut state = self.state.write().unwrap();
            *state = SessionState::default();
        }
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear persisted session: {}", e);
        }
    }
}

/// Best-effort extraction of the server-provided message from an error
/// response envelope.
async fn envelope_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ApiEnvelope<serde_json::Value>>().await {
        Ok(envelope) => envelope
            .message
            .unwrap_or_else(|| format!("HTTP {}", status)),
        Err(_) => format!("HTTP {}", status),
    }
}
