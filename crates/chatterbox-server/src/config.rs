//! Server configuration types.
//!
//! This module provides configuration types for the Chatterbox server,
//! using the builder pattern for ergonomic construction.
//!
//! # Example
//!
//! ```rust
//! use chatterbox_server::ServerConfig;
//! use std::time::Duration;
//!
//! let config = ServerConfig::builder()
//!     .http_addr("127.0.0.1:8080")
//!     .request_deadline(Duration::from_secs(90))
//!     .build();
//!
//! assert_eq!(config.http_addr(), "127.0.0.1:8080");
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use http::{HeaderMap, HeaderName, HeaderValue};

/// Default HTTP bind address.
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default per-request deadline in seconds.
pub const DEFAULT_REQUEST_DEADLINE_SECS: u64 = 90;

/// Default request body limit in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Server configuration.
///
/// Use [`ServerConfig::builder()`] to construct instances.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP server bind address
    http_addr: String,

    /// How long to wait for open connections after shutdown starts
    shutdown_timeout: Duration,

    /// Upper bound on each exchange; no head by then means `504`
    request_deadline: Duration,

    /// Largest request body a handler may read
    max_body_bytes: usize,

    /// Headers attached to synthesized `OPTIONS` responses
    cors: CorsPolicy,
}

impl ServerConfig {
    /// Creates a new server configuration builder.
    #[must_use]
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns the HTTP bind address.
    #[must_use]
    pub fn http_addr(&self) -> &str {
        &self.http_addr
    }

    /// Parses and returns the HTTP address as a `SocketAddr`.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be parsed.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.http_addr.parse()
    }

    /// Returns the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }

    /// Returns the per-request deadline.
    #[must_use]
    pub fn request_deadline(&self) -> Duration {
        self.request_deadline
    }

    /// Returns the request body limit.
    #[must_use]
    pub fn max_body_bytes(&self) -> usize {
        self.max_body_bytes
    }

    /// Returns the CORS policy.
    #[must_use]
    pub fn cors(&self) -> &CorsPolicy {
        &self.cors
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfigBuilder::default().build()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct ServerConfigBuilder {
    http_addr: String,
    shutdown_timeout: Duration,
    request_deadline: Duration,
    max_body_bytes: usize,
    cors: CorsPolicy,
}

impl Default for ServerConfigBuilder {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            shutdown_timeout: Duration::from_secs(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            request_deadline: Duration::from_secs(DEFAULT_REQUEST_DEADLINE_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            cors: CorsPolicy::default(),
        }
    }
}

impl ServerConfigBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP bind address.
    #[must_use]
    pub fn http_addr(mut self, addr: impl Into<String>) -> Self {
        self.http_addr = addr.into();
        self
    }

    /// Sets the graceful shutdown timeout.
    #[must_use]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Sets the per-request deadline.
    #[must_use]
    pub fn request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = deadline;
        self
    }

    /// Sets the request body limit.
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Sets the CORS policy.
    #[must_use]
    pub fn cors(mut self, cors: CorsPolicy) -> Self {
        self.cors = cors;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ServerConfig {
        ServerConfig {
            http_addr: self.http_addr,
            shutdown_timeout: self.shutdown_timeout,
            request_deadline: self.request_deadline,
            max_body_bytes: self.max_body_bytes,
            cors: self.cors,
        }
    }
}

/// CORS values sent with `OPTIONS` responses.
///
/// Each list becomes one comma-separated header; an empty list omits its
/// header entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsPolicy {
    allow_origins: Vec<String>,
    allow_methods: Vec<String>,
    allow_headers: Vec<String>,
}

impl CorsPolicy {
    /// Creates a policy from the three header lists.
    #[must_use]
    pub fn new(
        allow_origins: Vec<String>,
        allow_methods: Vec<String>,
        allow_headers: Vec<String>,
    ) -> Self {
        Self {
            allow_origins,
            allow_methods,
            allow_headers,
        }
    }

    /// Returns true if no CORS header would be sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allow_origins.is_empty()
            && self.allow_methods.is_empty()
            && self.allow_headers.is_empty()
    }

    /// Appends the configured headers to `headers`.
    ///
    /// Values that are not valid header text are skipped with a warning.
    pub fn apply(&self, headers: &mut HeaderMap) {
        append_list(headers, ACCESS_CONTROL_ALLOW_ORIGIN, &self.allow_origins);
        append_list(headers, ACCESS_CONTROL_ALLOW_METHODS, &self.allow_methods);
        append_list(headers, ACCESS_CONTROL_ALLOW_HEADERS, &self.allow_headers);
    }
}

fn append_list(headers: &mut HeaderMap, name: HeaderName, values: &[String]) {
    if values.is_empty() {
        return;
    }
    match HeaderValue::from_str(&values.join(", ")) {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => tracing::warn!(header = %name, "skipping CORS header with invalid value"),
    }
}
