//! Prometheus metrics for Chatterbox.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `chatterbox_requests_total` | Counter | `method`, `status` | Requests answered |
//! | `chatterbox_request_duration_seconds` | Histogram | `method` | Time until the response head |
//! | `chatterbox_in_flight_jobs` | Gauge | - | Jobs currently owned by handlers |
//! | `chatterbox_long_poll_waits_total` | Counter | `outcome` | Long-poll waits by outcome |
//! | `chatterbox_messages_stored_total` | Counter | - | Messages accepted by the store |
//!
//! Recording functions are no-ops until [`init_metrics`] installs a recorder.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use serde::{Deserialize, Serialize};

use crate::error::TelemetryError;
use crate::TelemetryResult;

/// Total requests.
pub const REQUESTS_TOTAL: &str = "chatterbox_requests_total";
/// Request duration histogram.
pub const REQUEST_DURATION_SECONDS: &str = "chatterbox_request_duration_seconds";
/// In-flight jobs gauge.
pub const IN_FLIGHT_JOBS: &str = "chatterbox_in_flight_jobs";
/// Long-poll wait counter.
pub const LONG_POLL_WAITS_TOTAL: &str = "chatterbox_long_poll_waits_total";
/// Stored messages counter.
pub const MESSAGES_STORED_TOTAL: &str = "chatterbox_messages_stored_total";

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether the exporter is installed.
    pub enabled: bool,

    /// Address of the Prometheus scrape listener.
    pub addr: String,

    /// Histogram buckets for request duration, in seconds.
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: "0.0.0.0:9090".to_string(),
            // Long-poll requests legitimately take up to a minute.
            duration_buckets: vec![
                0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 90.0,
            ],
        }
    }
}

/// Installs the Prometheus recorder and starts its scrape listener.
///
/// Inside a Tokio runtime the listener is spawned onto it; otherwise the
/// exporter runs on its own thread.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidAddress`] for an unparsable address and
/// [`TelemetryError::MetricsInit`] if the recorder cannot be installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let addr: SocketAddr = config
        .addr
        .parse()
        .map_err(|e| TelemetryError::InvalidAddress(format!("{}: {e}", config.addr)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets_for_metric(
            Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
            &config.duration_buckets,
        )
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?
        .install()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    register_metric_descriptions();

    Ok(())
}

fn register_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total number of HTTP requests answered");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        "Time from request arrival to response head in seconds"
    );
    describe_gauge!(IN_FLIGHT_JOBS, "Number of jobs currently owned by handlers");
    describe_counter!(LONG_POLL_WAITS_TOTAL, "Long-poll waits by outcome");
    describe_counter!(MESSAGES_STORED_TOTAL, "Messages accepted by the store");
}

/// Records an answered request.
pub fn record_request(method: &str, status_code: u16, duration: Duration) {
    counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(REQUEST_DURATION_SECONDS, "method" => method.to_string())
        .record(duration.as_secs_f64());
}

/// Records the end of a long-poll wait (`woken` or `timed_out`).
pub fn record_long_poll(outcome: &'static str) {
    counter!(LONG_POLL_WAITS_TOTAL, "outcome" => outcome).increment(1);
}

/// Records a stored message.
pub fn record_message_stored() {
    counter!(MESSAGES_STORED_TOTAL).increment(1);
}

/// Tracks one in-flight job; decrements the gauge on drop, even on panic.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Creates a new guard and increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!(IN_FLIGHT_JOBS).increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!(IN_FLIGHT_JOBS).decrement(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.addr, "0.0.0.0:9090");
        assert!(config.duration_buckets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_disabled_metrics_is_noop() {
        let config = MetricsConfig {
            enabled: false,
            addr: "not an address".to_string(),
            ..MetricsConfig::default()
        };
        assert!(init_metrics(&config).is_ok());
    }

    #[test]
    fn test_invalid_address() {
        let config = MetricsConfig {
            addr: "not an address".to_string(),
            ..MetricsConfig::default()
        };
        assert!(matches!(
            init_metrics(&config),
            Err(TelemetryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_record_functions_without_recorder() {
        record_request("GET", 200, Duration::from_millis(10));
        record_long_poll("woken");
        record_message_stored();
        drop(InFlightGuard::new());
    }
}
