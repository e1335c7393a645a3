//! Shared utilities for integration testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use ws_transport::{
    BoundAddress, ConnectionConfig, ConnectionOptions, RequestContext, Session, TransportConfig,
};

/// What the recording runtime saw for one session.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedSession {
    pub protocol: Option<String>,
    pub config: ConnectionConfig,
    pub user_agent: Option<String>,
    pub path: String,
}

/// Transport config bound to an ephemeral loopback port.
pub fn local_config() -> TransportConfig {
    let mut config = TransportConfig::default();
    config.listener.host = "127.0.0.1:0".to_string();
    config.listener.shutdown_grace_secs = 5;
    config
}

/// A session runtime that reports every session it receives, then drops it.
pub fn recording_runtime() -> (
    impl Fn(Session) -> std::future::Ready<()> + Send + Sync + 'static,
    mpsc::UnboundedReceiver<RecordedSession>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let runtime = move |session: Session| {
        let _ = tx.send(RecordedSession {
            protocol: session.protocol().map(String::from),
            config: session.config().clone(),
            user_agent: session.user_agent().map(String::from),
            path: session.request().path().to_string(),
        });
        std::future::ready(())
    };
    (runtime, rx)
}

/// A gate that counts invocations and always returns `options`.
#[allow(dead_code)]
pub fn counting_gate(
    options: ConnectionOptions,
) -> (
    impl Fn(&RequestContext) -> ConnectionOptions + Send + Sync + 'static,
    Arc<AtomicUsize>,
) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let gate = move |_: &RequestContext| {
        counter.fetch_add(1, Ordering::SeqCst);
        options.clone()
    };
    (gate, calls)
}

/// Client handshake request for `address`, optionally asking for subprotocols.
pub fn ws_request(address: &BoundAddress, protocols: Option<&str>) -> Request {
    let mut request = address
        .websocket_url()
        .as_str()
        .into_client_request()
        .unwrap();
    if let Some(protocols) = protocols {
        request
            .headers_mut()
            .insert("sec-websocket-protocol", HeaderValue::from_str(protocols).unwrap());
    }
    request
}

/// Wait briefly for the next recorded session.
#[allow(dead_code)]
pub async fn next_session(rx: &mut mpsc::UnboundedReceiver<RecordedSession>) -> RecordedSession {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("no session registered")
        .expect("runtime dropped")
}

/// Assert that no session arrives within a short window.
#[allow(dead_code)]
pub async fn assert_no_session(rx: &mut mpsc::UnboundedReceiver<RecordedSession>) {
    let outcome = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(outcome.is_err(), "unexpected session registered: {outcome:?}");
}
