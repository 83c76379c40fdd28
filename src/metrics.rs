//! Prometheus metrics for request authentication.
//!
//! Metrics are exposed via a dedicated HTTP listener when `METRICS_PORT` is
//! non-zero.
//!
//! # Available Metrics
//!
//! ## Counters
//! - `hmac_auth_requests_total` - Authentication decisions (label: `outcome`)
//!
//! ## Histograms
//! - `hmac_auth_duration_seconds` - Time spent buffering and verifying a request
//!
//! # Usage
//!
//! ```rust,ignore
//! use hmac_sample::metrics::{init_metrics, record_auth_outcome};
//!
//! init_metrics("0.0.0.0:9090".parse()?)?;
//! record_auth_outcome("authorized");
//! ```

use std::net::SocketAddr;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{error, info};

/// Metric names as constants for consistency.
pub mod names {
    pub const AUTH_REQUESTS_TOTAL: &str = "hmac_auth_requests_total";
    pub const AUTH_DURATION_SECONDS: &str = "hmac_auth_duration_seconds";
}

/// Initialize the Prometheus metrics exporter.
///
/// # Errors
///
/// Returns a message if the exporter cannot be installed (e.g., the port is
/// already bound or a recorder is already set).
pub fn init_metrics(metrics_addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        names::AUTH_REQUESTS_TOTAL,
        "Total number of HMAC authentication decisions by outcome"
    );
    describe_histogram!(
        names::AUTH_DURATION_SECONDS,
        "Time spent buffering the body and verifying the signature"
    );

    info!(addr = %metrics_addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// Try to initialize metrics, logging any errors but not failing.
pub fn try_init_metrics(metrics_addr: SocketAddr) {
    if let Err(e) = init_metrics(metrics_addr) {
        error!(error = %e, "Failed to initialize metrics, continuing without metrics");
    }
}

/// Record one authentication decision.
pub fn record_auth_outcome(outcome: &'static str) {
    counter!(names::AUTH_REQUESTS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record how long verification took.
pub fn record_auth_duration(duration_secs: f64) {
    histogram!(names::AUTH_DURATION_SECONDS).record(duration_secs);
}
