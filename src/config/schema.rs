//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the transport.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the transport.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransportConfig {
    /// Listener configuration (bind address, keep-alive, TLS).
    pub listener: ListenerConfig,

    /// Connection parameters applied by the default accept-all gate.
    pub connection: ConnectionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080"). Port 0 picks an ephemeral port.
    pub host: String,

    /// TCP keep-alive period in seconds.
    /// Negative disables keep-alive, zero selects the 30 second default.
    pub keep_alive_secs: i64,

    /// Per-request deadline in seconds (0 = no deadline).
    pub read_timeout_secs: u64,

    /// How long graceful shutdown waits for in-flight HTTP connections
    /// before closing them (0 = wait indefinitely).
    pub shutdown_grace_secs: u64,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0:8080".to_string(),
            keep_alive_secs: 0,
            read_timeout_secs: 0,
            shutdown_grace_secs: 30,
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Per-connection parameters handed to the session runtime.
///
/// Returned by a [`ConnectionGate`](crate::hooks::ConnectionGate) inside
/// [`ConnectionOptions::Accept`](crate::hooks::ConnectionOptions::Accept).
/// Buffer and size limits are applied to the WebSocket before the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Subprotocols this endpoint speaks, in preference order.
    pub subprotocols: Vec<String>,

    /// Read buffer capacity in bytes.
    pub read_buffer_size: usize,

    /// Target size of the write buffer before flushing, in bytes.
    pub write_buffer_size: usize,

    /// Hard limit on buffered outgoing data, in bytes.
    pub max_write_buffer_size: usize,

    /// Largest accepted message, in bytes (`None` = unlimited).
    pub max_message_size: Option<usize>,

    /// Largest accepted frame, in bytes (`None` = unlimited).
    pub max_frame_size: Option<usize>,

    /// Maximum number of requests the runtime should process concurrently
    /// for this connection (0 = unlimited).
    pub concurrency_limit: u32,

    /// Free-form values attached by the gate for the runtime.
    pub info: BTreeMap<String, String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            subprotocols: Vec::new(),
            read_buffer_size: 128 * 1024,
            write_buffer_size: 128 * 1024,
            max_write_buffer_size: usize::MAX,
            max_message_size: Some(64 << 20),
            max_frame_size: Some(16 << 20),
            concurrency_limit: 0,
            info: BTreeMap::new(),
        }
    }
}

impl ConnectionConfig {
    /// Set the supported subprotocols.
    pub fn with_subprotocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subprotocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    /// Attach an info value for the runtime.
    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info.insert(key.into(), value.into());
        self
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
