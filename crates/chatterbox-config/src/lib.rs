//! Typed configuration for Chatterbox.
//!
//! This crate provides a strongly-typed configuration system with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env → `PORT`)
//!
//! # Overview
//!
//! [`ChatterboxConfig`] contains every section:
//!
//! - [`ServerConfig`] - bind address, deadlines, body limit
//! - [`TelemetryConfig`] - logging and metrics
//! - [`ChatConfig`] - long-poll timeout, message limits, user cache
//! - [`CorsConfig`] - headers for `OPTIONS` responses
//! - [`FrontendConfig`] - static front-end routes
//! - [`InvitesConfig`] - invite creation switch
//!
//! # Example
//!
//! ```no_run
//! use chatterbox_config::ConfigLoader;
//!
//! # fn main() -> Result<(), chatterbox_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("chatterbox.toml")?
//!     .with_env_prefix("CHATTERBOX")
//!     .with_port_env()
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "127.0.0.1:8080"
//! request_deadline_secs = 90
//!
//! [telemetry.logging]
//! level = "info"
//! json_format = true
//!
//! [telemetry.metrics]
//! enabled = true
//! addr = "0.0.0.0:9090"
//!
//! [chat]
//! long_poll_timeout_secs = 60
//! default_message_limit = 50
//!
//! [cors]
//! allow_origins = ["*"]
//!
//! [frontend]
//! map_file = "routes.json"
//!
//! [invites]
//! creation_enabled = false
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values are overridden with `PREFIX__SECTION__KEY`, for example:
//!
//! - `CHATTERBOX__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `CHATTERBOX__TELEMETRY__LOGGING__LEVEL=debug`
//! - `CHATTERBOX__CORS__ALLOW_METHODS=GET,POST`
//!
//! With [`ConfigLoader::with_port_env`], a bare `PORT` replaces the port.

mod config;
mod error;
mod loader;
mod schema;

pub use chatterbox_telemetry::{LogConfig, MetricsConfig, TelemetryConfig};
pub use config::{ChatterboxConfig, ChatterboxConfigBuilder};
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{ChatConfig, CorsConfig, FrontendConfig, InvitesConfig, ServerConfig};
