//! Transport facade.
//!
//! # Responsibilities
//! - Own configuration, TLS settings and the hooks
//! - Bind the listener and run the accept loop
//! - Expose the bound address
//! - Coordinate shutdown: refuse new sessions, close the listener, leave
//!   upgraded sessions to the runtime
//!
//! # Example
//!
//! ```rust,ignore
//! use ws_transport::{Session, Transport, TransportConfig};
//!
//! let transport = Transport::new(TransportConfig::default());
//! let address = transport.start(|session: Session| async move {
//!     // take ownership of the socket
//! }).await?;
//! println!("listening on {}", address.url());
//!
//! transport.shutdown();
//! transport.wait().await?;
//! ```

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use axum_server::Handle;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::validation::validate_config;
use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::hooks::{AcceptAll, ConnectionGate, EmptyOptions, OptionsResponder, SessionRuntime};
use crate::http::{build_router, AppState, UpgradeGate};
use crate::lifecycle::ShutdownState;
use crate::net::{ConnectionTracker, KeepAlive, KeepAliveAcceptor, TlsSettings};

/// Where the listener actually ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundAddress {
    socket_addr: SocketAddr,
    url: Url,
    websocket_url: Url,
}

impl BoundAddress {
    fn new(socket_addr: SocketAddr, tls: bool) -> Result<Self, url::ParseError> {
        let (http, ws) = if tls { ("https", "wss") } else { ("http", "ws") };
        Ok(Self {
            socket_addr,
            url: Url::parse(&format!("{http}://{socket_addr}/"))?,
            websocket_url: Url::parse(&format!("{ws}://{socket_addr}/"))?,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.socket_addr
    }

    /// `http://` or `https://` URL of the endpoint.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `ws://` or `wss://` URL of the endpoint.
    pub fn websocket_url(&self) -> &Url {
        &self.websocket_url
    }

    pub fn is_tls(&self) -> bool {
        self.url.scheme() == "https"
    }
}

/// HTTP → WebSocket transport.
///
/// Every method takes `&self`, so a started transport can be shared through
/// an `Arc` between the task awaiting [`Transport::wait`] and whoever calls
/// [`Transport::shutdown`].
pub struct Transport {
    config: TransportConfig,
    tls: TlsSettings,
    gate: Arc<dyn ConnectionGate>,
    options: Arc<dyn OptionsResponder>,
    shutdown: ShutdownState,
    sessions: ConnectionTracker,
    handle: Handle,
    started: AtomicBool,
    address: OnceLock<BoundAddress>,
    server: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
}

impl Transport {
    /// Create a transport that accepts every upgrade with `config.connection`
    /// and answers `OPTIONS` with an empty `200 OK`.
    pub fn new(config: TransportConfig) -> Self {
        let tls = config
            .listener
            .tls
            .as_ref()
            .map(TlsSettings::from)
            .unwrap_or_default();

        Self {
            gate: Arc::new(AcceptAll(config.connection.clone())),
            options: Arc::new(EmptyOptions),
            tls,
            config,
            shutdown: ShutdownState::new(),
            sessions: ConnectionTracker::new(),
            handle: Handle::new(),
            started: AtomicBool::new(false),
            address: OnceLock::new(),
            server: Mutex::new(None),
        }
    }

    /// Replace the pre-upgrade hook.
    pub fn with_gate(mut self, gate: impl ConnectionGate) -> Self {
        self.gate = Arc::new(gate);
        self
    }

    /// Replace the `OPTIONS` responder.
    pub fn with_options_responder(mut self, responder: impl OptionsResponder) -> Self {
        self.options = Arc::new(responder);
        self
    }

    /// Serve TLS with a pre-built context. Takes precedence over configured paths.
    pub fn with_tls_context(mut self, context: RustlsConfig) -> Self {
        self.tls = self.tls.with_context(context);
        self
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Resolve TLS, bind, and start serving. Sessions go to `runtime`.
    ///
    /// Returns once the listener is bound; configuration, TLS and bind
    /// failures are reported here before any request is served. A failed
    /// start leaves the transport unstarted, so it may be retried.
    pub async fn start(&self, runtime: impl SessionRuntime) -> Result<&BoundAddress, TransportError> {
        if self.shutdown.is_shutting_down() {
            return Err(TransportError::ShuttingDown);
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(TransportError::AlreadyStarted);
        }

        let result = self.bind_and_serve(runtime).await;
        if result.is_err() {
            self.started.store(false, Ordering::SeqCst);
        }
        result
    }

    async fn bind_and_serve(&self, runtime: impl SessionRuntime) -> Result<&BoundAddress, TransportError> {
        self.validate()?;
        let listener_config = &self.config.listener;
        let tls = self.tls.resolve().await?;

        let bind_error = |source| TransportError::Bind {
            address: listener_config.host.clone(),
            source,
        };
        let listener = TcpListener::bind(listener_config.host.as_str())
            .await
            .map_err(bind_error)?;
        let local_addr = listener.local_addr().map_err(bind_error)?;
        let listener = listener.into_std().map_err(bind_error)?;
        let address = BoundAddress::new(local_addr, tls.is_some())?;

        let state = AppState {
            upgrade: UpgradeGate::new(
                Arc::clone(&self.gate),
                Arc::new(runtime),
                self.shutdown.clone(),
                self.sessions.clone(),
            ),
            options: Arc::clone(&self.options),
        };
        let read_timeout = non_zero_secs(listener_config.read_timeout_secs);
        let app = build_router(state, read_timeout).into_make_service_with_connect_info::<SocketAddr>();

        let acceptor = KeepAliveAcceptor::plain(KeepAlive::from_secs(listener_config.keep_alive_secs));
        let keep_alive = acceptor.keep_alive();
        let handle = self.handle.clone();

        let task = match tls {
            Some(tls) => tokio::spawn(
                axum_server::from_tcp(listener)
                    .acceptor(RustlsAcceptor::new(tls).acceptor(acceptor))
                    .handle(handle)
                    .serve(app),
            ),
            None => tokio::spawn(
                axum_server::from_tcp(listener)
                    .acceptor(acceptor)
                    .handle(handle)
                    .serve(app),
            ),
        };
        *self.server.lock().await = Some(task);

        tracing::info!(
            address = %address.url(),
            keep_alive = ?keep_alive.period(),
            read_timeout = ?read_timeout,
            "Transport listening"
        );

        Ok(self.address.get_or_init(|| address))
    }

    /// Semantic config checks. Certificate paths are moot once a pre-built
    /// TLS context is attached.
    fn validate(&self) -> Result<(), TransportError> {
        let Err(errors) = validate_config(&self.config) else {
            return Ok(());
        };
        let errors: Vec<_> = errors
            .into_iter()
            .filter(|error| !(self.tls.has_context() && error.field.starts_with("listener.tls.")))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }

    /// Begin graceful shutdown.
    ///
    /// New upgrade attempts are refused from this point on, the listener is
    /// closed, and in-flight HTTP exchanges get `shutdown_grace_secs` to
    /// finish. Upgraded sessions are not touched. Idempotent.
    pub fn shutdown(&self) {
        if !self.shutdown.trigger() {
            return;
        }

        let grace = non_zero_secs(self.config.listener.shutdown_grace_secs);
        tracing::info!(grace = ?grace, "Transport shutting down");
        self.handle.graceful_shutdown(grace);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_shutting_down()
    }

    /// Shared shutdown flag, e.g. for a runtime that drains its own sessions.
    pub fn shutdown_state(&self) -> ShutdownState {
        self.shutdown.clone()
    }

    /// The bound address; [`TransportError::NotStarted`] before [`Transport::start`] binds.
    pub fn address(&self) -> Result<&BoundAddress, TransportError> {
        self.address.get().ok_or(TransportError::NotStarted)
    }

    /// Sessions currently owned by the runtime.
    pub fn active_sessions(&self) -> u64 {
        self.sessions.active_count()
    }

    /// Wait for the accept loop to end.
    ///
    /// `Ok` after a graceful shutdown has drained; [`TransportError::Serve`]
    /// if the listener failed unexpectedly. Only the first caller waits on
    /// the loop; later calls get [`TransportError::NotStarted`].
    pub async fn wait(&self) -> Result<(), TransportError> {
        let task = self.server.lock().await.take().ok_or(TransportError::NotStarted)?;
        task.await?.map_err(TransportError::Serve)?;
        tracing::info!("Transport stopped");
        Ok(())
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
