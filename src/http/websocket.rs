//! WebSocket upgrade gate.
//!
//! # Data Flow
//! ```text
//! Request
//!   → shutdown check ──(shutting down)──→ 503
//!   → ConnectionGate::evaluate ──(Refuse)──→ 403
//!   → handshake validation ──(malformed)──→ 400 / 405 / 426
//!   → 101 Switching Protocols
//!   → SessionRuntime::on_new_connection(Session)
//! ```
//!
//! # Design Decisions
//! - Shutdown is checked before the hook; attempts already past the hook finish
//! - The hook runs on the blocking pool so slow admission logic never stalls I/O
//! - Handshake failures answer the one client and are never retried

use std::sync::Arc;

use axum::extract::ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::config::ConnectionConfig;
use crate::hooks::{ConnectionGate, ConnectionOptions, SessionRuntime};
use crate::http::request::{select_protocol, RequestContext};
use crate::lifecycle::ShutdownState;
use crate::net::{ConnectionId, ConnectionTracker};
use crate::observability::metrics::{self, UpgradeOutcome};
use crate::session::Session;

/// Decides per request whether it becomes a session.
#[derive(Clone)]
pub struct UpgradeGate {
    gate: Arc<dyn ConnectionGate>,
    runtime: Arc<dyn SessionRuntime>,
    shutdown: ShutdownState,
    sessions: ConnectionTracker,
}

impl UpgradeGate {
    pub fn new(
        gate: Arc<dyn ConnectionGate>,
        runtime: Arc<dyn SessionRuntime>,
        shutdown: ShutdownState,
        sessions: ConnectionTracker,
    ) -> Self {
        Self {
            gate,
            runtime,
            shutdown,
            sessions,
        }
    }

    /// Run one upgrade attempt to completion of the HTTP exchange.
    ///
    /// `upgrade` is the result of axum's handshake extractor; it is only
    /// consulted after the hook has accepted the request.
    pub async fn handle(
        &self,
        context: RequestContext,
        upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    ) -> Response {
        if self.shutdown.is_shutting_down() {
            tracing::debug!(path = %context.path(), "Refusing upgrade: shutting down");
            metrics::record_upgrade(UpgradeOutcome::ShuttingDown);
            return (StatusCode::SERVICE_UNAVAILABLE, "Server is shutting down").into_response();
        }

        let gate = Arc::clone(&self.gate);
        let evaluated = tokio::task::spawn_blocking(move || {
            let options = gate.evaluate(&context);
            (context, options)
        })
        .await;

        let (context, config) = match evaluated {
            Ok((context, ConnectionOptions::Accept(config))) => (context, config),
            Ok((context, ConnectionOptions::Refuse)) => {
                tracing::debug!(
                    path = %context.path(),
                    peer_addr = ?context.peer_addr(),
                    "Upgrade refused by gate"
                );
                metrics::record_upgrade(UpgradeOutcome::Refused);
                return (StatusCode::FORBIDDEN, "Connection refused").into_response();
            }
            Err(error) => {
                tracing::error!(error = %error, "Connection gate failed");
                metrics::record_upgrade(UpgradeOutcome::HookFailed);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };

        if config.max_write_buffer_size <= config.write_buffer_size {
            tracing::error!(
                write_buffer_size = config.write_buffer_size,
                max_write_buffer_size = config.max_write_buffer_size,
                "Gate returned an unusable connection config"
            );
            metrics::record_upgrade(UpgradeOutcome::HookFailed);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }

        let upgrade = match upgrade {
            Ok(upgrade) => upgrade,
            Err(rejection) => {
                tracing::warn!(
                    path = %context.path(),
                    peer_addr = ?context.peer_addr(),
                    status = %rejection.status(),
                    reason = %rejection.body_text(),
                    "WebSocket handshake rejected"
                );
                metrics::record_upgrade(UpgradeOutcome::HandshakeRejected);
                return rejection.into_response();
            }
        };

        let protocol = select_protocol(context.protocols(), &config.subprotocols);
        let upgrade = configure(upgrade, &config, protocol.as_deref());

        let id = ConnectionId::new();
        let runtime = Arc::clone(&self.runtime);
        let shutdown = self.shutdown.clone();
        let sessions = self.sessions.clone();
        metrics::record_upgrade(UpgradeOutcome::Accepted);
        tracing::debug!(
            connection_id = %id,
            path = %context.path(),
            protocol = ?protocol,
            "Upgrading connection"
        );

        upgrade
            .on_failed_upgrade(move |error| {
                tracing::warn!(connection_id = %id, error = %error, "WebSocket upgrade failed");
                metrics::record_upgrade(UpgradeOutcome::UpgradeFailed);
            })
            .on_upgrade(move |socket| async move {
                let _guard = sessions.track(id);
                let session = Session::new(id, socket, config, protocol, context, shutdown);
                runtime.on_new_connection(session).await;
            })
    }
}

fn configure(
    upgrade: WebSocketUpgrade,
    config: &ConnectionConfig,
    protocol: Option<&str>,
) -> WebSocketUpgrade {
    let mut upgrade = upgrade
        .read_buffer_size(config.read_buffer_size)
        .write_buffer_size(config.write_buffer_size)
        .max_write_buffer_size(config.max_write_buffer_size);

    if let Some(size) = config.max_message_size {
        upgrade = upgrade.max_message_size(size);
    }
    if let Some(size) = config.max_frame_size {
        upgrade = upgrade.max_frame_size(size);
    }
    if let Some(protocol) = protocol {
        upgrade = upgrade.protocols([protocol.to_owned()]);
    }
    upgrade
}
