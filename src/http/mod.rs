//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, dispatch by method)
//!     → request.rs (capture context, parse subprotocols)
//!     → options.rs (OPTIONS → responder)
//!     → websocket.rs (everything else → upgrade gate)
//! ```

pub mod options;
pub mod request;
pub mod server;
pub mod websocket;

pub use request::RequestContext;
pub use server::{build_router, AppState};
pub use websocket::UpgradeGate;
