//! Extension points for the embedding application.
//!
//! The transport calls out through three traits:
//!
//! - [`ConnectionGate`] decides, before the handshake, whether a request may
//!   become a session and with which [`ConnectionConfig`].
//! - [`SessionRuntime`] takes ownership of every upgraded [`Session`].
//! - [`OptionsResponder`] answers `OPTIONS` discovery requests.
//!
//! Each is implemented for plain closures of the matching shape.

use std::future::Future;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;

use crate::config::ConnectionConfig;
use crate::http::RequestContext;
use crate::session::Session;

/// Verdict of a [`ConnectionGate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionOptions {
    /// Upgrade with these per-connection parameters.
    Accept(ConnectionConfig),
    /// Reject the request; no handshake is attempted.
    Refuse,
}

/// Pre-upgrade admission hook.
///
/// Called once per upgrade attempt, after the shutdown check and before the
/// handshake. Runs on the blocking thread pool, so it may do blocking work
/// (an auth lookup, say), but the transport imposes no deadline on it.
pub trait ConnectionGate: Send + Sync + 'static {
    fn evaluate(&self, request: &RequestContext) -> ConnectionOptions;
}

impl<F> ConnectionGate for F
where
    F: Fn(&RequestContext) -> ConnectionOptions + Send + Sync + 'static,
{
    fn evaluate(&self, request: &RequestContext) -> ConnectionOptions {
        self(request)
    }
}

/// Gate that admits everything with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct AcceptAll(pub ConnectionConfig);

impl ConnectionGate for AcceptAll {
    fn evaluate(&self, _request: &RequestContext) -> ConnectionOptions {
        ConnectionOptions::Accept(self.0.clone())
    }
}

/// Owner of upgraded sessions.
///
/// Invoked exactly once per completed upgrade. The returned future runs on
/// its own task; the session counts as active until it resolves.
pub trait SessionRuntime: Send + Sync + 'static {
    fn on_new_connection(&self, session: Session) -> BoxFuture<'static, ()>;
}

impl<F, Fut> SessionRuntime for F
where
    F: Fn(Session) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn on_new_connection(&self, session: Session) -> BoxFuture<'static, ()> {
        Box::pin(self(session))
    }
}

/// Responder for HTTP `OPTIONS` requests.
pub trait OptionsResponder: Send + Sync + 'static {
    fn respond(&self, request: &RequestContext) -> Response;
}

impl<F> OptionsResponder for F
where
    F: Fn(&RequestContext) -> Response + Send + Sync + 'static,
{
    fn respond(&self, request: &RequestContext) -> Response {
        self(request)
    }
}

/// Default responder: `200 OK` with an empty body.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyOptions;

impl OptionsResponder for EmptyOptions {
    fn respond(&self, _request: &RequestContext) -> Response {
        StatusCode::OK.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn context() -> RequestContext {
        RequestContext::from_request(&Request::builder().uri("/").body(()).unwrap())
    }

    #[test]
    fn accept_all_clones_config() {
        let config = ConnectionConfig::default().with_subprotocols(["chat"]);
        let gate = AcceptAll(config.clone());
        assert_eq!(gate.evaluate(&context()), ConnectionOptions::Accept(config));
    }

    #[test]
    fn closures_are_gates() {
        let gate = |request: &RequestContext| {
            if request.path() == "/" {
                ConnectionOptions::Refuse
            } else {
                ConnectionOptions::Accept(ConnectionConfig::default())
            }
        };
        assert_eq!(gate.evaluate(&context()), ConnectionOptions::Refuse);
    }

    #[test]
    fn empty_options_is_ok() {
        let response = EmptyOptions.respond(&context());
        assert_eq!(response.status(), StatusCode::OK);
    }
}
