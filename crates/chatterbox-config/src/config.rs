//! Main configuration types.
//!
//! This module provides the top-level [`ChatterboxConfig`] struct and its builder.

use std::net::SocketAddr;

use chatterbox_telemetry::{LogConfig, TelemetryConfig};
use serde::{Deserialize, Serialize};

use crate::{ChatConfig, ConfigError, CorsConfig, FrontendConfig, InvitesConfig, ServerConfig};

/// Complete Chatterbox configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use chatterbox_config::ChatterboxConfig;
///
/// let config = ChatterboxConfig::default();
/// assert_eq!(config.server.http_addr, "127.0.0.1:8080");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ChatterboxConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Telemetry configuration (logging, metrics).
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Chat behaviour.
    #[serde(default)]
    pub chat: ChatConfig,

    /// CORS headers for `OPTIONS` responses.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Static front-end routes.
    #[serde(default)]
    pub frontend: FrontendConfig,

    /// Invite settings.
    #[serde(default)]
    pub invites: InvitesConfig,
}

impl ChatterboxConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> ChatterboxConfigBuilder {
        ChatterboxConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if:
    /// - the server or (enabled) metrics address is not a socket address
    /// - the request deadline does not exceed the long-poll timeout
    /// - message limits are zero or the default exceeds the maximum
    /// - the cache sweep interval or body limit is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        let metrics = &self.telemetry.metrics;
        if metrics.enabled && metrics.addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid(
                "telemetry.metrics.addr",
                format!("invalid socket address: {}", metrics.addr),
            ));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::invalid(
                "server.max_body_bytes",
                "must be greater than 0",
            ));
        }

        if self.chat.long_poll_timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "chat.long_poll_timeout_secs",
                "must be greater than 0",
            ));
        }

        if self.server.request_deadline_secs <= self.chat.long_poll_timeout_secs {
            return Err(ConfigError::invalid(
                "server.request_deadline_secs",
                format!(
                    "must exceed chat.long_poll_timeout_secs ({})",
                    self.chat.long_poll_timeout_secs
                ),
            ));
        }

        if self.chat.default_message_limit == 0
            || self.chat.default_message_limit > self.chat.max_message_limit
        {
            return Err(ConfigError::invalid(
                "chat.default_message_limit",
                format!(
                    "must be between 1 and chat.max_message_limit ({})",
                    self.chat.max_message_limit
                ),
            ));
        }

        if self.chat.cache_sweep_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "chat.cache_sweep_interval_secs",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Development preset: readable logs, demo data, no metrics listener.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.telemetry.logging = LogConfig::development();
        config.telemetry.metrics.enabled = false;
        config.chat.seed_demo_data = true;
        config
    }

    /// Production preset: JSON logs, metrics enabled.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();
        config.telemetry.logging = LogConfig::production();
        config.telemetry.metrics.enabled = true;
        config
    }
}

/// Builder for [`ChatterboxConfig`].
#[derive(Debug, Default)]
pub struct ChatterboxConfigBuilder {
    server: Option<ServerConfig>,
    telemetry: Option<TelemetryConfig>,
    chat: Option<ChatConfig>,
    cors: Option<CorsConfig>,
    frontend: Option<FrontendConfig>,
    invites: Option<InvitesConfig>,
}

impl ChatterboxConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server configuration.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.server = Some(server);
        self
    }

    /// Set the telemetry configuration.
    #[must_use]
    pub fn telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Set the chat configuration.
    #[must_use]
    pub fn chat(mut self, chat: ChatConfig) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Set the CORS configuration.
    #[must_use]
    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = Some(cors);
        self
    }

    /// Set the front-end configuration.
    #[must_use]
    pub fn frontend(mut self, frontend: FrontendConfig) -> Self {
        self.frontend = Some(frontend);
        self
    }

    /// Set the invite configuration.
    #[must_use]
    pub fn invites(mut self, invites: InvitesConfig) -> Self {
        self.invites = Some(invites);
        self
    }

    /// Build the configuration. Unset sections use their defaults.
    #[must_use]
    pub fn build(self) -> ChatterboxConfig {
        ChatterboxConfig {
            server: self.server.unwrap_or_default(),
            telemetry: self.telemetry.unwrap_or_default(),
            chat: self.chat.unwrap_or_default(),
            cors: self.cors.unwrap_or_default(),
            frontend: self.frontend.unwrap_or_default(),
            invites: self.invites.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<ChatterboxConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
