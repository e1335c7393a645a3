//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (buffer sizes > 0, addresses parse)
//! - Detect incomplete TLS material
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TransportConfig → Result<(), Vec<ValidationError>>
//! - Runs before the listener is bound

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::TransportConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &TransportConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::new("listener.host", "must not be empty"));
    }

    if let Some(tls) = &config.listener.tls {
        match (tls.cert_path.is_empty(), tls.key_path.is_empty()) {
            (false, true) => errors.push(ValidationError::new(
                "listener.tls.key_path",
                "required when cert_path is set",
            )),
            (true, false) => errors.push(ValidationError::new(
                "listener.tls.cert_path",
                "required when key_path is set",
            )),
            _ => {}
        }
    }

    let connection = &config.connection;
    if connection.read_buffer_size == 0 {
        errors.push(ValidationError::new("connection.read_buffer_size", "must be greater than 0"));
    }
    if connection.write_buffer_size == 0 {
        errors.push(ValidationError::new("connection.write_buffer_size", "must be greater than 0"));
    }
    if connection.max_write_buffer_size <= connection.write_buffer_size {
        errors.push(ValidationError::new(
            "connection.max_write_buffer_size",
            "must be greater than write_buffer_size",
        ));
    }
    if connection.subprotocols.iter().any(|p| p.trim().is_empty()) {
        errors.push(ValidationError::new("connection.subprotocols", "must not contain empty names"));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address {:?}", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TlsConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&TransportConfig::default()).is_ok());
    }

    #[test]
    fn partial_tls_paths_rejected() {
        let mut config = TransportConfig::default();
        config.listener.tls = Some(TlsConfig {
            cert_path: "cert.pem".into(),
            key_path: String::new(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "listener.tls.key_path");
    }

    #[test]
    fn empty_tls_section_means_disabled() {
        let mut config = TransportConfig::default();
        config.listener.tls = Some(TlsConfig::default());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = TransportConfig::default();
        config.listener.host = "  ".into();
        config.connection.read_buffer_size = 0;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "not-an-address".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.host",
                "connection.read_buffer_size",
                "observability.metrics_address"
            ]
        );
    }
}
