//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (keep-alive socket options, best effort)
//!     → tls.rs (optional rustls handshake)
//!     → Hand off to HTTP layer
//!     → connection.rs (id + tracking once upgraded)
//! ```
//!
//! # Design Decisions
//! - Keep-alive is an accept interceptor layered under TLS
//! - Socket option failures never refuse a connection
//! - TLS is optional and resolved once at startup

pub mod connection;
pub mod listener;
pub mod tls;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{KeepAlive, KeepAliveAcceptor, DEFAULT_KEEP_ALIVE};
pub use tls::{TlsError, TlsSettings};
