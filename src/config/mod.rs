//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TransportConfig (validated, immutable)
//!     → handed to Transport::new, read-only once started
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the listener starts
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ConnectionConfig, ListenerConfig, ObservabilityConfig, TlsConfig, TransportConfig};
pub use validation::ValidationError;
