//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Flag set → Upgrade gate refuses new sessions → Listener closed
//!     → In-flight HTTP drained (bounded by grace period)
//!     → Upgraded sessions left to the runtime
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::ShutdownState;
