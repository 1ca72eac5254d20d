//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// HTTP server section.
///
/// # Example
///
/// ```
/// use chatterbox_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:3000".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.request_deadline_secs, 90);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "127.0.0.1:8080").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Upper bound on the time until a response head is written.
    #[serde(default = "default_request_deadline")]
    pub request_deadline_secs: u64,

    /// Largest request body a handler may read.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            request_deadline_secs: default_request_deadline(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Returns the shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Returns the per-request deadline.
    #[must_use]
    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }
}

fn default_http_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_deadline() -> u64 {
    90
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

/// Chat behaviour section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// How long a polling request waits for a new message.
    #[serde(default = "default_long_poll_timeout")]
    pub long_poll_timeout_secs: u64,

    /// Messages returned when `limit` is absent.
    #[serde(default = "default_message_limit")]
    pub default_message_limit: usize,

    /// Largest accepted `limit`.
    #[serde(default = "default_max_message_limit")]
    pub max_message_limit: usize,

    /// Lifetime of cached store lookups.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Interval between sweeps of expired cache entries.
    #[serde(default = "default_cache_sweep_interval")]
    pub cache_sweep_interval_secs: u64,

    /// Seed demo users, messages and an invite at startup.
    #[serde(default)]
    pub seed_demo_data: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            long_poll_timeout_secs: default_long_poll_timeout(),
            default_message_limit: default_message_limit(),
            max_message_limit: default_max_message_limit(),
            cache_ttl_secs: default_cache_ttl(),
            cache_sweep_interval_secs: default_cache_sweep_interval(),
            seed_demo_data: false,
        }
    }
}

impl ChatConfig {
    /// Returns the long-poll timeout.
    #[must_use]
    pub fn long_poll_timeout(&self) -> Duration {
        Duration::from_secs(self.long_poll_timeout_secs)
    }

    /// Returns the cache entry lifetime.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Returns the cache sweep interval.
    #[must_use]
    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_secs)
    }
}

fn default_long_poll_timeout() -> u64 {
    60
}

fn default_message_limit() -> usize {
    50
}

fn default_max_message_limit() -> usize {
    200
}

fn default_cache_ttl() -> u64 {
    500
}

fn default_cache_sweep_interval() -> u64 {
    30
}

/// CORS headers attached to `OPTIONS` responses.
///
/// Empty lists omit the corresponding header.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// `Access-Control-Allow-Origin` values.
    #[serde(default)]
    pub allow_origins: Vec<String>,

    /// `Access-Control-Allow-Methods` values.
    #[serde(default)]
    pub allow_methods: Vec<String>,

    /// `Access-Control-Allow-Headers` values.
    #[serde(default)]
    pub allow_headers: Vec<String>,
}

/// Static front-end section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FrontendConfig {
    /// JSON object mapping request paths to asset file names.
    /// No static routes are served when unset.
    #[serde(default)]
    pub map_file: Option<String>,

    /// Directory the asset file names are relative to.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            map_file: None,
            assets_dir: default_assets_dir(),
        }
    }
}

fn default_assets_dir() -> String {
    "assets".to_string()
}

/// Invite section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InvitesConfig {
    /// Whether `POST /api/v1/invites` creates invites.
    #[serde(default)]
    pub creation_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, "127.0.0.1:8080");
        assert_eq!(config.request_deadline(), Duration::from_secs(90));
        assert_eq!(config.max_body_bytes, 65536);
    }

    #[test]
    fn test_chat_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.long_poll_timeout(), Duration::from_secs(60));
        assert_eq!(config.cache_ttl(), Duration::from_secs(500));
        assert_eq!(config.cache_sweep_interval(), Duration::from_secs(30));
        assert_eq!(config.default_message_limit, 50);
        assert_eq!(config.max_message_limit, 200);
        assert!(!config.seed_demo_data);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<ChatConfig, _> = toml::from_str("long_poll_timeout = 5");
        assert!(result.is_err());
    }

    #[test]
    fn test_cors_partial() {
        let config: CorsConfig = toml::from_str(r#"allow_origins = ["*"]"#).unwrap();
        assert_eq!(config.allow_origins, vec!["*"]);
        assert!(config.allow_methods.is_empty());
    }
}
