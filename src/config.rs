//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub realtime: RealtimeConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP API client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api/v1".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Realtime broker connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default = "default_ws_url")]
    pub url: String,

    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_ms: u64,

    /// Heartbeat interval in both directions. Zero disables heartbeats.
    #[serde(default = "default_heartbeat")]
    pub heartbeat_ms: u64,
}

fn default_ws_url() -> String {
    "ws://localhost:8080/api/v1/ws-scalehub".to_string()
}

fn default_reconnect_delay() -> u64 {
    5000
}

fn default_heartbeat() -> u64 {
    4000
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: default_ws_url(),
            reconnect_delay_ms: default_reconnect_delay(),
            heartbeat_ms: default_heartbeat(),
        }
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_dir")]
    pub storage_dir: String,
}

fn default_session_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("scalehub").to_string_lossy().to_string())
        .unwrap_or_else(|| "./scalehub_data".to_string())
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_session_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("scalehub").join("config.toml")),
            Some(PathBuf::from("/etc/scalehub/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(base_url) = std::env::var("SCALEHUB_API_BASE_URL") {
            self.api.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("SCALEHUB_REQUEST_TIMEOUT_SECS") {
            if let Ok(t) = timeout.parse() {
                self.api.request_timeout_secs = t;
            }
        }

        if let Ok(url) = std::env::var("SCALEHUB_WS_URL") {
            self.realtime.url = url;
        }
        if let Ok(delay) = std::env::var("SCALEHUB_RECONNECT_DELAY_MS") {
            if let Ok(d) = delay.parse() {
                self.realtime.reconnect_delay_ms = d;
            }
        }

        if let Ok(dir) = std::env::var("SCALEHUB_SESSION_DIR") {
            self.session.storage_dir = dir;
        }

        if let Ok(level) = std::env::var("SCALEHUB_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("SCALEHUB_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            realtime: RealtimeConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# ScaleHub Client Configuration
#
# Environment variables override these settings:
# - SCALEHUB_API_BASE_URL
# - SCALEHUB_REQUEST_TIMEOUT_SECS
# - SCALEHUB_WS_URL
# - SCALEHUB_RECONNECT_DELAY_MS
# - SCALEHUB_SESSION_DIR
# - SCALEHUB_LOG_LEVEL
# - SCALEHUB_LOG_FORMAT

[api]
# Base URL of the ScaleHub backend API
base_url = "http://localhost:8080/api/v1"

# Request timeout in seconds
request_timeout_secs = 30

[realtime]
# STOMP-over-WebSocket broker endpoint
url = "ws://localhost:8080/api/v1/ws-scalehub"

# Fixed delay between reconnection attempts (ms)
reconnect_delay_ms = 5000

# Heartbeat interval, both directions (ms). 0 disables heartbeats
heartbeat_ms = 4000

[session]
# Directory for the persisted session file
storage_dir = "~/.local/share/scalehub"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/scalehub/scalehub.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:8080/api/v1");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.realtime.reconnect_delay_ms, 5000);
        assert_eq!(config.realtime.heartbeat_ms, 4000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
            [api]
            base_url = "https://scales.example.com/api/v1"

            [realtime]
            reconnect_delay_ms = 1000
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.api.base_url, "https://scales.example.com/api/v1");
        assert_eq!(config.api.request_timeout_secs, 30);
        assert_eq!(config.realtime.reconnect_delay_ms, 1000);
        assert_eq!(config.realtime.heartbeat_ms, 4000);
    }

    #[test]
    fn test_generated_config_parses() {
        let content = generate_default_config();
        let parsed: Result<Config, _> = toml::from_str(&content);
        assert!(parsed.is_ok());
    }
}
