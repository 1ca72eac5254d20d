//! Observability for Chatterbox.
//!
//! - **Logging**: structured JSON or human-readable output via `tracing-subscriber`
//! - **Metrics**: Prometheus-format metrics via the `metrics` crate
//!
//! # Example
//!
//! ```rust,ignore
//! use chatterbox_telemetry::{init_telemetry, LogConfig, TelemetryConfig};
//!
//! let config = TelemetryConfig::builder()
//!     .logging(LogConfig::development())
//!     .without_metrics()
//!     .build();
//!
//! init_telemetry(&config)?;
//! ```
//!
//! # Metrics Endpoint
//!
//! When enabled, the Prometheus exporter serves its own scrape listener:
//!
//! ```text
//! # TYPE chatterbox_requests_total counter
//! chatterbox_requests_total{method="GET",status="200"} 1234
//! chatterbox_long_poll_waits_total{outcome="woken"} 87
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, TelemetryConfigBuilder};
pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig};
pub use metrics::{init_metrics, InFlightGuard, MetricsConfig};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Initializes logging, then metrics.
///
/// # Errors
///
/// Returns [`TelemetryError`] if either subsystem fails to initialize.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryResult<()> {
    init_logging(&config.logging)?;
    init_metrics(&config.metrics)?;
    Ok(())
}
