//! TLS configuration and certificate loading.

use std::fmt;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

use crate::config::TlsConfig;

/// Error type for TLS resolution.
#[derive(Debug, Error)]
pub enum TlsError {
    /// Only one of the certificate/key pair was supplied.
    #[error("TLS requires both a certificate and a private key path")]
    IncompletePaths,
    /// Certificate file does not exist.
    #[error("Certificate file not found: {0:?}")]
    CertificateNotFound(PathBuf),
    /// Private key file does not exist.
    #[error("Private key file not found: {0:?}")]
    PrivateKeyNotFound(PathBuf),
    /// Files exist but could not be turned into a server config.
    #[error("Failed to load TLS material: {0}")]
    Load(#[source] std::io::Error),
}

/// Where the listener's TLS context comes from.
///
/// Holds either a certificate/key path pair, a ready [`RustlsConfig`], or
/// nothing (plain HTTP). Resolved once at startup by [`TlsSettings::resolve`].
#[derive(Clone, Default)]
pub struct TlsSettings {
    cert_path: Option<PathBuf>,
    key_path: Option<PathBuf>,
    context: Option<RustlsConfig>,
}

impl TlsSettings {
    /// TLS disabled.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Load certificate and key from PEM files at startup.
    pub fn from_files(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            cert_path: non_empty(cert_path.into()),
            key_path: non_empty(key_path.into()),
            context: None,
        }
    }

    /// Use a pre-built context.
    pub fn from_context(context: RustlsConfig) -> Self {
        Self {
            context: Some(context),
            ..Self::default()
        }
    }

    /// Attach a pre-built context. It takes precedence over any paths.
    pub fn with_context(mut self, context: RustlsConfig) -> Self {
        self.context = Some(context);
        self
    }

    /// Whether a pre-built context is attached; paths are then ignored.
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Produce the effective TLS context for the listener.
    ///
    /// Returns `Ok(None)` when TLS is disabled. A pre-built context wins over
    /// file paths when both are present.
    pub async fn resolve(&self) -> Result<Option<RustlsConfig>, TlsError> {
        if let Some(context) = &self.context {
            if self.cert_path.is_some() || self.key_path.is_some() {
                tracing::warn!(
                    cert_path = ?self.cert_path,
                    key_path = ?self.key_path,
                    "Pre-built TLS context supplied; ignoring certificate paths"
                );
            }
            return Ok(Some(context.clone()));
        }

        match (&self.cert_path, &self.key_path) {
            (None, None) => Ok(None),
            (Some(cert), Some(key)) => load_tls_config(cert, key).await.map(Some),
            _ => Err(TlsError::IncompletePaths),
        }
    }
}

impl From<&TlsConfig> for TlsSettings {
    fn from(config: &TlsConfig) -> Self {
        Self::from_files(&config.cert_path, &config.key_path)
    }
}

impl fmt::Debug for TlsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsSettings")
            .field("cert_path", &self.cert_path)
            .field("key_path", &self.key_path)
            .field("context", &self.context.as_ref().map(|_| ".."))
            .finish()
    }
}

fn non_empty(path: PathBuf) -> Option<PathBuf> {
    (!path.as_os_str().is_empty()).then_some(path)
}

/// Load TLS configuration from certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, TlsError> {
    if !cert_path.exists() {
        return Err(TlsError::CertificateNotFound(cert_path.to_path_buf()));
    }
    if !key_path.exists() {
        return Err(TlsError::PrivateKeyNotFound(key_path.to_path_buf()));
    }

    RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(TlsError::Load)
}
