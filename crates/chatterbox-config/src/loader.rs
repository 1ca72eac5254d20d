//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::Path;

use crate::{ChatterboxConfig, ConfigError};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (built into the code)
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables (`PREFIX__SECTION__KEY`)
/// 4. The bare `PORT` variable, if enabled
///
/// # Example
///
/// ```no_run
/// use chatterbox_config::ConfigLoader;
///
/// # fn main() -> Result<(), chatterbox_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("chatterbox.toml")?
///     .with_env_prefix("CHATTERBOX")
///     .with_port_env()
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: ChatterboxConfig,
    env_prefix: Option<String>,
    port_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ChatterboxConfig::default(),
            env_prefix: None,
            port_env: false,
        }
    }

    /// Start with default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = ChatterboxConfig::default();
        self
    }

    /// Start with development preset configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use chatterbox_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_development()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert!(config.chat.seed_demo_data);
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = ChatterboxConfig::development();
        self
    }

    /// Start with production preset configuration.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = ChatterboxConfig::production();
        self
    }

    /// Load configuration from a file.
    ///
    /// Supports TOML (.toml) and JSON (.json) formats, chosen by extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::missing_file(path),
            _ => ConfigError::read(path, e),
        })?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        self.config = parse(&content, format)
            .map_err(|e| match e {
                ConfigError::UnsupportedFormat(_) => {
                    ConfigError::UnsupportedFormat(path.display().to_string())
                }
                other => other,
            })?;
        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read or parsed.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in the given format ("toml" or "json").
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing fails or the format is unknown.
    ///
    /// # Example
    ///
    /// ```
    /// use chatterbox_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [chat]
    ///     long_poll_timeout_secs = 30
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.chat.long_poll_timeout_secs, 30);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        self.config = parse(content, format)?;
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`, e.g.
    /// `CHATTERBOX__CHAT__LONG_POLL_TIMEOUT_SECS=30`. List values are
    /// comma-separated.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Let a bare `PORT` variable replace the port of `server.http_addr`.
    ///
    /// Applied after prefixed overrides.
    #[must_use]
    pub fn with_port_env(mut self) -> Self {
        self.port_env = true;
        self
    }

    /// Load a `.env` file into the process environment if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a `.env` file exists but cannot be parsed.
    pub fn with_dotenv(self) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if e.not_found() => Ok(self),
            Err(e) => Err(e.into()),
        }
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable cannot be parsed or
    /// validation fails.
    pub fn load(mut self) -> Result<ChatterboxConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        if self.port_env {
            if let Ok(port) = env::var("PORT") {
                self.apply_port(&port)?;
            }
        }

        self.config.validate()?;
        Ok(self.config)
    }

    /// Finalize without validation or environment overrides.
    #[must_use]
    pub fn load_unvalidated(self) -> ChatterboxConfig {
        self.config
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let env_vars: HashMap<String, String> = env::vars()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_port(&mut self, port: &str) -> Result<(), ConfigError> {
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::env("PORT", "expected port number"))?;

        let mut addr: SocketAddr = self.config.server.http_addr.parse().map_err(|_| {
            ConfigError::invalid(
                "server.http_addr",
                format!("invalid socket address: {}", self.config.server.http_addr),
            )
        })?;
        addr.set_port(port);
        self.config.server.http_addr = addr.to_string();
        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let key_without_prefix = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
            .ok_or_else(|| ConfigError::env(key, "invalid key format"))?;

        let parts: Vec<&str> = key_without_prefix.split("__").collect();
        let config = &mut self.config;

        match parts.as_slice() {
            // Server section
            ["SERVER", "HTTP_ADDR"] => config.server.http_addr = value.to_string(),
            ["SERVER", "SHUTDOWN_TIMEOUT_SECS"] => {
                config.server.shutdown_timeout_secs = parse_int(key, value)?;
            }
            ["SERVER", "REQUEST_DEADLINE_SECS"] => {
                config.server.request_deadline_secs = parse_int(key, value)?;
            }
            ["SERVER", "MAX_BODY_BYTES"] => config.server.max_body_bytes = parse_int(key, value)?,

            // Telemetry logging
            ["TELEMETRY", "LOGGING", "ENABLED"] => {
                config.telemetry.logging.enabled = parse_flag(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "LEVEL"] => config.telemetry.logging.level = value.to_string(),
            ["TELEMETRY", "LOGGING", "JSON_FORMAT"] => {
                config.telemetry.logging.json_format = parse_flag(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "SPAN_EVENTS"] => {
                config.telemetry.logging.span_events = parse_flag(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "FILE_LINE_INFO"] => {
                config.telemetry.logging.file_line_info = parse_flag(key, value)?;
            }
            ["TELEMETRY", "LOGGING", "INCLUDE_TARGET"] => {
                config.telemetry.logging.include_target = parse_flag(key, value)?;
            }

            // Telemetry metrics
            ["TELEMETRY", "METRICS", "ENABLED"] => {
                config.telemetry.metrics.enabled = parse_flag(key, value)?;
            }
            ["TELEMETRY", "METRICS", "ADDR"] => config.telemetry.metrics.addr = value.to_string(),

            // Chat section
            ["CHAT", "LONG_POLL_TIMEOUT_SECS"] => {
                config.chat.long_poll_timeout_secs = parse_int(key, value)?;
            }
            ["CHAT", "DEFAULT_MESSAGE_LIMIT"] => {
                config.chat.default_message_limit = parse_int(key, value)?;
            }
            ["CHAT", "MAX_MESSAGE_LIMIT"] => config.chat.max_message_limit = parse_int(key, value)?,
            ["CHAT", "CACHE_TTL_SECS"] => config.chat.cache_ttl_secs = parse_int(key, value)?,
            ["CHAT", "CACHE_SWEEP_INTERVAL_SECS"] => {
                config.chat.cache_sweep_interval_secs = parse_int(key, value)?;
            }
            ["CHAT", "SEED_DEMO_DATA"] => config.chat.seed_demo_data = parse_flag(key, value)?,

            // CORS section
            ["CORS", "ALLOW_ORIGINS"] => config.cors.allow_origins = parse_list(value),
            ["CORS", "ALLOW_METHODS"] => config.cors.allow_methods = parse_list(value),
            ["CORS", "ALLOW_HEADERS"] => config.cors.allow_headers = parse_list(value),

            // Front-end section
            ["FRONTEND", "MAP_FILE"] => {
                config.frontend.map_file = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            ["FRONTEND", "ASSETS_DIR"] => config.frontend.assets_dir = value.to_string(),

            // Invites section
            ["INVITES", "CREATION_ENABLED"] => {
                config.invites.creation_enabled = parse_flag(key, value)?;
            }

            // Unknown key - ignore
            _ => {}
        }

        Ok(())
    }
}

fn parse_int<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::env(key, "expected integer"))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env(key, "expected boolean"))
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated list, dropping empty items.
fn parse_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}

fn parse(content: &str, format: &str) -> Result<ChatterboxConfig, ConfigError> {
    match format.to_ascii_lowercase().as_str() {
        "toml" => Ok(toml::from_str(content)?),
        "json" => Ok(serde_json::from_str(content)?),
        _ => Err(ConfigError::UnsupportedFormat(format.to_string())),
    }
}
