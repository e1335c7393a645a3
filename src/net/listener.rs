//! TCP keep-alive enforcement for accepted connections.
//!
//! # Responsibilities
//! - Map the configured keep-alive period onto socket options
//! - Apply them to every accepted stream before the HTTP layer sees it
//! - Treat socket option failures as warnings, never as refusals

use std::io;
use std::time::Duration;

use axum_server::accept::{Accept, DefaultAcceptor};
use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpStream;

use crate::observability::metrics;

/// Keep-alive period used when the configuration asks for the default.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// TCP keep-alive policy for accepted connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAlive {
    /// Keep-alive probing switched off.
    Disabled,
    /// Keep-alive on, probing after this much idle time and at this interval.
    Enabled(Duration),
}

impl KeepAlive {
    /// Negative disables, zero selects [`DEFAULT_KEEP_ALIVE`], positive is used as-is.
    pub fn from_secs(secs: i64) -> Self {
        match secs {
            s if s < 0 => Self::Disabled,
            0 => Self::Enabled(DEFAULT_KEEP_ALIVE),
            s => Self::Enabled(Duration::from_secs(s.unsigned_abs())),
        }
    }

    /// Effective probe period, if enabled.
    pub fn period(&self) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::Enabled(period) => Some(*period),
        }
    }

    /// Apply this policy to a connected socket.
    pub fn apply(&self, stream: &TcpStream) -> io::Result<()> {
        let socket = SockRef::from(stream);
        match self {
            Self::Disabled => socket.set_keepalive(false),
            Self::Enabled(period) => {
                socket.set_keepalive(true)?;
                let params = TcpKeepalive::new().with_time(*period).with_interval(*period);
                socket.set_tcp_keepalive(&params)
            }
        }
    }
}

impl Default for KeepAlive {
    fn default() -> Self {
        Self::Enabled(DEFAULT_KEEP_ALIVE)
    }
}

/// Accept interceptor that applies [`KeepAlive`] to each raw TCP stream.
///
/// Wraps any inner acceptor, so it can sit beneath TLS:
/// `RustlsAcceptor::new(tls).acceptor(KeepAliveAcceptor::new(DefaultAcceptor::new(), ka))`.
#[derive(Debug, Clone)]
pub struct KeepAliveAcceptor<A = DefaultAcceptor> {
    inner: A,
    keep_alive: KeepAlive,
}

impl KeepAliveAcceptor {
    /// Keep-alive directly over plain TCP.
    pub fn plain(keep_alive: KeepAlive) -> Self {
        Self::new(DefaultAcceptor::new(), keep_alive)
    }
}

impl<A> KeepAliveAcceptor<A> {
    /// Wrap `inner`, applying `keep_alive` before delegating.
    pub fn new(inner: A, keep_alive: KeepAlive) -> Self {
        Self { inner, keep_alive }
    }

    /// The policy being applied.
    pub fn keep_alive(&self) -> KeepAlive {
        self.keep_alive
    }
}

impl<A, S> Accept<TcpStream, S> for KeepAliveAcceptor<A>
where
    A: Accept<TcpStream, S>,
{
    type Stream = A::Stream;
    type Service = A::Service;
    type Future = A::Future;

    fn accept(&self, stream: TcpStream, service: S) -> Self::Future {
        if let Err(error) = self.keep_alive.apply(&stream) {
            tracing::warn!(
                peer_addr = ?stream.peer_addr().ok(),
                keep_alive = ?self.keep_alive,
                error = %error,
                "Failed to set TCP keep-alive; continuing without it"
            );
            metrics::record_keep_alive_error();
        }

        self.inner.accept(stream, service)
    }
}
