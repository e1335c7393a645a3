//! HTTP → WebSocket transport with application-controlled admission,
//! TCP keep-alive, TLS and graceful shutdown.

pub mod config;
pub mod error;
pub mod hooks;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod session;
pub mod transport;

pub use config::{ConnectionConfig, TransportConfig};
pub use error::TransportError;
pub use hooks::{AcceptAll, ConnectionGate, ConnectionOptions, EmptyOptions, OptionsResponder, SessionRuntime};
pub use http::RequestContext;
pub use lifecycle::ShutdownState;
pub use net::{KeepAlive, TlsSettings};
pub use session::Session;
pub use transport::{BoundAddress, Transport};
