//! Metrics collection and exposition.
//!
//! # Metrics
//! - `transport_upgrades_total` (counter): upgrade attempts by outcome
//! - `transport_keepalive_errors_total` (counter): keep-alive socket option failures
//! - `transport_options_requests_total` (counter): OPTIONS requests answered
//! - `transport_active_sessions` (gauge): sessions currently owned by the runtime
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Outcome of a single upgrade attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// Refused because shutdown has begun.
    ShuttingDown,
    /// Refused by the pre-upgrade hook.
    Refused,
    /// The pre-upgrade hook panicked.
    HookFailed,
    /// Handshake request was malformed or unsupported.
    HandshakeRejected,
    /// Switching-protocols response sent.
    Accepted,
    /// The connection failed after the switching-protocols response.
    UpgradeFailed,
}

impl UpgradeOutcome {
    /// Label value used for the `outcome` dimension.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShuttingDown => "shutting_down",
            Self::Refused => "refused",
            Self::HookFailed => "hook_failed",
            Self::HandshakeRejected => "handshake_rejected",
            Self::Accepted => "accepted",
            Self::UpgradeFailed => "upgrade_failed",
        }
    }
}

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_upgrade(outcome: UpgradeOutcome) {
    metrics::counter!("transport_upgrades_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_keep_alive_error() {
    metrics::counter!("transport_keepalive_errors_total").increment(1);
}

pub fn record_options_request() {
    metrics::counter!("transport_options_requests_total").increment(1);
}

pub fn set_active_sessions(count: u64) {
    metrics::gauge!("transport_active_sessions").set(count as f64);
}
