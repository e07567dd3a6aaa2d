//! # ScaleHub
//!
//! Client core for an industrial scale monitoring platform: session and
//! token management against the platform's REST API, plus a realtime
//! telemetry feed over STOMP/WebSocket.
//!
//! ## Features
//!
//! - **Sessions**: Login, logout, and token refresh with single-flight
//!   refresh so concurrent expired requests trigger exactly one refresh
//! - **REST client**: Bearer-token injection with transparent retry of
//!   requests that hit an expired access token
//! - **Realtime**: Persistent STOMP subscription to scale telemetry with
//!   automatic reconnect and resubscription
//! - **Snapshots**: Observable last-write-wins map of the latest reading
//!   per scale
//!
//! ## Modules
//!
//! - [`auth`]: Session lifecycle, roles, and token persistence
//! - [`api`]: Typed REST client for scales, locations, users, roles, reports
//! - [`realtime`]: STOMP/WebSocket connection and snapshot store
//! - [`config`]: File and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scalehub::api::ApiClient;
//! use scalehub::auth::{FileSessionStore, SessionManager};
//! use scalehub::config::Config;
//! use scalehub::realtime::RealtimeClient;
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!
//!     // Authenticate
//!     let store = FileSessionStore::new(Path::new(&config.session.storage_dir));
//!     let session = Arc::new(SessionManager::new(
//!         config.api.base_url.clone(),
//!         Duration::from_secs(config.api.request_timeout_secs),
//!         Box::new(store),
//!     ));
//!     session.login("admin", "secret").await?;
//!
//!     // Call the API
//!     let api = ApiClient::new(&config.api, Arc::clone(&session));
//!     for scale in api.scales().list().await? {
//!         println!("{}: {}", scale.id, scale.name);
//!     }
//!
//!     // Stream telemetry; subscribe once the connection is up
//!     let realtime = RealtimeClient::new(config.realtime.clone());
//!     let mut connected = realtime.connected();
//!     realtime.connect();
//!     while !*connected.borrow_and_update() {
//!         connected.changed().await?;
//!     }
//!     let mut updates = realtime.snapshots().watch();
//!     realtime.subscribe_all();
//!     while let Ok(snapshot) = updates.recv().await {
//!         println!("scale {} -> {:?}", snapshot.scale_id, snapshot.status);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod realtime;

// Re-export top-level types for convenience
pub use api::{ApiClient, ApiError};

pub use auth::{AuthError, FileSessionStore, Permission, RoleRef, SessionManager, UserSnapshot};

pub use config::{Config, ConfigError};

pub use realtime::{
    scale_topic, RealtimeClient, RealtimeEvent, ScaleSnapshot, ScaleStatus, SnapshotStore,
    SubscriptionRegistry, TOPIC_ALL_SCALES,
};
