//! Top-level error type.

use thiserror::Error;

use crate::config::{ConfigError, ValidationError};
use crate::net::TlsError;

/// Errors surfaced by the [`Transport`](crate::Transport) lifecycle.
///
/// Everything here is fatal to the transport; per-connection failures are
/// answered on the wire and logged instead.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] TlsError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build listen address: {0}")]
    Address(#[from] url::ParseError),

    #[error("transport already started")]
    AlreadyStarted,

    #[error("transport has not been started")]
    NotStarted,

    #[error("transport is shutting down")]
    ShuttingDown,

    #[error("accept loop terminated: {0}")]
    Serve(#[source] std::io::Error),

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<Vec<ValidationError>> for TransportError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Config(ConfigError::Validation(errors))
    }
}
