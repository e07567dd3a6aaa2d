//! Authenticated HTTP Transport
//!
//! [`ApiClient`] wraps the backend REST API: it attaches the bearer
//! token to every outbound request, unwraps the `{success, data,
//! message}` envelope, and makes token expiry transparent. A 401
//! response triggers exactly one refresh (single-flight across
//! concurrent requests) and one replay of the original request; a
//! replayed request never refreshes again.

pub mod dto;
mod locations;
mod reports;
mod roles;
mod scales;
mod users;

pub use locations::{CreateLocationRequest, Location, LocationTree, LocationsApi, UpdateLocationRequest};
pub use reports::{DailyReport, ReportFilter, ReportsApi, WeighingLog};
pub use roles::{CreateRoleRequest, Role, RolesApi, UpdateRoleRequest};
pub use scales::{
    CreateScaleRequest, Protocol, RegisterDataType, Scale, ScaleConfig, ScalesApi, SerialParity,
    UpdateScaleRequest,
};
pub use users::{CreateUserRequest, UpdateUserRequest, User, UserStatus, UsersApi};

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::{AuthError, SessionManager};
use crate::config::ApiConfig;
use dto::ApiEnvelope;

/// Errors from API operations
#[derive(Debug, Error)]
pub enum ApiError {
    /// Server rejected the request (4xx/5xx other than 401)
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// No response received
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// Request exceeded the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Still unauthorized after a successful refresh and replay
    #[error("Session expired")]
    SessionExpired,

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Token refresh failed; the session has been cleared
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP client for the ScaleHub backend
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    /// Create a client sharing the given session manager
    pub fn new(config: &ApiConfig, session: Arc<SessionManager>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: config.base_url.clone(),
            session,
        }
    }

    /// The session manager backing this client
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// GET a resource
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let response = self.send(Method::GET, path, None).await?;
        self.unwrap_envelope(response).await
    }

    /// POST a resource
    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self.send(Method::POST, path, Some(body)).await?;
        self.unwrap_envelope(response).await
    }

    /// PUT a resource
    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self.send(Method::PUT, path, Some(body)).await?;
        self.unwrap_envelope(response).await
    }

    /// DELETE a resource
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        let response = self.send(Method::DELETE, path, None).await?;
        self.expect_success(response).await
    }

    /// Send a request with the current token, refreshing and replaying
    /// once on 401.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> ApiResult<reqwest::Response> {
        let token = self.session.access_token();
        let response = self
            .dispatch(&method, path, body.as_ref(), token.as_deref())
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        // One refresh, one replay. refresh_after is single-flight, so
        // concurrent 401s share a single refresh round-trip.
        let fresh = self.session.refresh_after(token.as_deref()).await?;
        self.dispatch(&method, path, body.as_ref(), Some(&fresh))
            .await
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Option<&serde_json::Value>,
        token: Option<&str>,
    ) -> ApiResult<reqwest::Response> {
        let mut request = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path));

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Network(e)
            }
        })
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ApiResult<T> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: read_message(response).await,
            });
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;

        if !envelope.success {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "request rejected".to_string()),
            });
        }

        envelope
            .data
            .ok_or_else(|| ApiError::Decode("response missing data field".to_string()))
    }

    async fn expect_success(&self, response: reqwest::Response) -> ApiResult<()> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::SessionExpired);
        }
        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: read_message(response).await,
            });
        }

        Ok(())
    }

    /// Scale device operations
    pub fn scales(&self) -> ScalesApi<'_> {
        ScalesApi { client: self }
    }

    /// Location hierarchy operations
    pub fn locations(&self) -> LocationsApi<'_> {
        LocationsApi { client: self }
    }

    /// User management operations
    pub fn users(&self) -> UsersApi<'_> {
        UsersApi { client: self }
    }

    /// Role and permission operations
    pub fn roles(&self) -> RolesApi<'_> {
        RolesApi { client: self }
    }

    /// Aggregate report operations
    pub fn reports(&self) -> ReportsApi<'_> {
        ReportsApi { client: self }
    }
}

/// Pull the server-provided message out of an error envelope
async fn read_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<ApiEnvelope<serde_json::Value>>().await {
        Ok(envelope) => envelope
            .message
            .unwrap_or_else(|| format!("HTTP {}", status)),
        Err(_) => format!("HTTP {}", status),
    }
}
