//! Upgraded connections handed to the session runtime.

use std::fmt;

use axum::extract::ws::WebSocket;

use crate::config::ConnectionConfig;
use crate::http::RequestContext;
use crate::lifecycle::ShutdownState;
use crate::net::ConnectionId;

/// An upgraded WebSocket plus everything decided about it before the handshake.
pub struct Session {
    id: ConnectionId,
    socket: WebSocket,
    config: ConnectionConfig,
    protocol: Option<String>,
    request: RequestContext,
    shutdown: ShutdownState,
}

impl Session {
    pub(crate) fn new(
        id: ConnectionId,
        socket: WebSocket,
        config: ConnectionConfig,
        protocol: Option<String>,
        request: RequestContext,
        shutdown: ShutdownState,
    ) -> Self {
        Self {
            id,
            socket,
            config,
            protocol,
            request,
            shutdown,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Options returned by the gate for this connection.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Negotiated subprotocol, if any.
    pub fn protocol(&self) -> Option<&str> {
        self.protocol.as_deref()
    }

    /// The request that was upgraded.
    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.request.user_agent()
    }

    /// Transport shutdown flag; runtimes use it to drain sessions.
    pub fn shutdown(&self) -> &ShutdownState {
        &self.shutdown
    }

    pub fn socket_mut(&mut self) -> &mut WebSocket {
        &mut self.socket
    }

    /// Take the socket, dropping the rest.
    pub fn into_socket(self) -> WebSocket {
        self.socket
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("protocol", &self.protocol)
            .field("path", &self.request.path())
            .field("peer_addr", &self.request.peer_addr())
            .finish_non_exhaustive()
    }
}
