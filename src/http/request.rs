//! Request context handed to hooks.
//!
//! # Responsibilities
//! - Capture what a hook may inspect: method, path, headers, peer address
//! - Parse the client's requested WebSocket subprotocols
//! - Pick the subprotocol to echo back

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, Request, Uri};

pub const SEC_WEBSOCKET_PROTOCOL: &str = "sec-websocket-protocol";

/// Snapshot of an incoming request, owned so hooks can run off the I/O task.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    peer_addr: Option<SocketAddr>,
    protocols: Vec<String>,
}

impl RequestContext {
    /// Capture the parts of `request` hooks can see.
    ///
    /// The peer address is present when the server was built with
    /// `into_make_service_with_connect_info::<SocketAddr>()`.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        let peer_addr = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
            peer_addr,
            protocols: requested_protocols(request.headers()),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header(header::USER_AGENT.as_str())
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Subprotocols requested by the client, in the client's order.
    pub fn protocols(&self) -> &[String] {
        &self.protocols
    }
}

/// Get the requested subprotocols from the headers.
pub fn requested_protocols(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SEC_WEBSOCKET_PROTOCOL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(',').map(str::trim))
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// First client-requested protocol the server also supports.
pub fn select_protocol(requested: &[String], supported: &[String]) -> Option<String> {
    requested
        .iter()
        .find(|p| supported.iter().any(|s| s == *p))
        .cloned()
}
