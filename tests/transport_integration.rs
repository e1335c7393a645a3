//! End-to-end tests against a running transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::Message as ServerMessage;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use ws_transport::{ConnectionConfig, ConnectionOptions, RequestContext, Transport};

mod common;

#[tokio::test]
async fn test_handshake_with_subprotocol() {
    let mut config = common::local_config();
    config.listener.keep_alive_secs = 0;
    config.connection = ConnectionConfig::default()
        .with_subprotocols(["json", "chat"])
        .with_info("tier", "gold");

    let (runtime, mut sessions) = common::recording_runtime();
    let transport = Transport::new(config);
    let address = transport.start(runtime).await.unwrap().clone();
    assert!(!address.is_tls());

    let mut request = common::ws_request(&address, Some("chat"));
    request
        .headers_mut()
        .insert("user-agent", "integration-test/1.0".parse().unwrap());
    let (socket, response) = connect_async(request).await.expect("handshake failed");

    assert_eq!(response.status().as_u16(), 101);
    assert_eq!(
        response
            .headers()
            .get("sec-websocket-protocol")
            .and_then(|v| v.to_str().ok()),
        Some("chat")
    );

    let session = common::next_session(&mut sessions).await;
    assert_eq!(session.protocol.as_deref(), Some("chat"));
    assert_eq!(session.config.info.get("tier").map(String::as_str), Some("gold"));
    assert_eq!(session.user_agent.as_deref(), Some("integration-test/1.0"));
    assert_eq!(session.path, "/");
    common::assert_no_session(&mut sessions).await;

    drop(socket);
    transport.shutdown();
    transport.wait().await.unwrap();
}

#[tokio::test]
async fn test_exact_gate_options_reach_runtime() {
    let options = ConnectionConfig::default()
        .with_subprotocols(["chat"])
        .with_info("user", "alice");
    let expected = options.clone();
    let (gate, calls) = common::counting_gate(ConnectionOptions::Accept(options));
    let (runtime, mut sessions) = common::recording_runtime();

    let transport = Transport::new(common::local_config()).with_gate(gate);
    let address = transport.start(runtime).await.unwrap().clone();

    let (_socket, _) = connect_async(common::ws_request(&address, None)).await.unwrap();

    let session = common::next_session(&mut sessions).await;
    assert_eq!(session.config, expected);
    assert_eq!(session.protocol, None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    transport.shutdown();
}

#[tokio::test]
async fn test_refusing_gate_blocks_upgrade() {
    let (gate, calls) = common::counting_gate(ConnectionOptions::Refuse);
    let (runtime, mut sessions) = common::recording_runtime();

    let transport = Transport::new(common::local_config()).with_gate(gate);
    let address = transport.start(runtime).await.unwrap().clone();

    match connect_async(common::ws_request(&address, Some("chat"))).await {
        Err(WsError::Http(response)) => assert_eq!(response.status().as_u16(), 403),
        other => panic!("expected HTTP rejection, got {other:?}"),
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    common::assert_no_session(&mut sessions).await;
    assert_eq!(transport.active_sessions(), 0);

    transport.shutdown();
}

#[tokio::test]
async fn test_plain_get_is_handshake_failure() {
    let (runtime, mut sessions) = common::recording_runtime();
    let transport = Transport::new(common::local_config());
    let address = transport.start(runtime).await.unwrap().clone();

    let response = reqwest::Client::new()
        .get(address.url().clone())
        .send()
        .await
        .expect("transport unreachable");

    assert!(response.status().is_client_error());
    common::assert_no_session(&mut sessions).await;

    transport.shutdown();
}

#[tokio::test]
async fn test_shutdown_lets_in_flight_handshake_finish() {
    let (entered_tx, mut entered_rx) = mpsc::unbounded_channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let release_rx = Mutex::new(release_rx);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let gate = move |_: &RequestContext| {
        counter.fetch_add(1, Ordering::SeqCst);
        let _ = entered_tx.send(());
        let _ = release_rx.lock().unwrap().recv();
        ConnectionOptions::Accept(ConnectionConfig::default())
    };
    let (runtime, mut sessions) = common::recording_runtime();

    let transport = Arc::new(Transport::new(common::local_config()).with_gate(gate));
    let address = transport.start(runtime).await.unwrap().clone();

    let pending = tokio::spawn(connect_async(common::ws_request(&address, None)));

    // The hook is now holding the request past the shutdown check.
    tokio::time::timeout(Duration::from_secs(5), entered_rx.recv())
        .await
        .expect("hook not reached")
        .unwrap();
    transport.shutdown();
    assert!(transport.is_shutting_down());
    release_tx.send(()).unwrap();

    let (socket, response) = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("in-flight handshake stalled")
        .unwrap()
        .expect("in-flight handshake should complete");
    assert_eq!(response.status().as_u16(), 101);
    common::next_session(&mut sessions).await;
    drop(socket);

    tokio::time::timeout(Duration::from_secs(10), transport.wait())
        .await
        .expect("transport did not drain")
        .unwrap();

    // The listener is gone: new attempts never reach the hook.
    assert!(connect_async(common::ws_request(&address, None)).await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    common::assert_no_session(&mut sessions).await;
}

#[tokio::test]
async fn test_upgraded_session_outlives_shutdown() {
    let runtime = |mut session: ws_transport::Session| async move {
        while let Some(Ok(message)) = session.socket_mut().recv().await {
            match message {
                ServerMessage::Text(_) | ServerMessage::Binary(_) => {
                    if session.socket_mut().send(message).await.is_err() {
                        break;
                    }
                }
                ServerMessage::Close(_) => break,
                _ => {}
            }
        }
    };

    let mut config = common::local_config();
    config.listener.shutdown_grace_secs = 1;
    let transport = Transport::new(config);
    let address = transport.start(runtime).await.unwrap().clone();

    let (mut socket, _) = connect_async(common::ws_request(&address, None)).await.unwrap();
    socket.send(Message::text("before")).await.unwrap();
    assert_eq!(socket.next().await.unwrap().unwrap(), Message::text("before"));

    transport.shutdown();
    tokio::time::timeout(Duration::from_secs(5), transport.wait())
        .await
        .expect("transport did not stop")
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    socket.send(Message::text("still here")).await.unwrap();
    let echoed = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("session stopped echoing")
        .unwrap()
        .unwrap();
    assert_eq!(echoed, Message::text("still here"));
    assert_eq!(transport.active_sessions(), 1);
}

#[tokio::test]
async fn test_options_default_response() {
    let (runtime, _sessions) = common::recording_runtime();
    let transport = Transport::new(common::local_config());
    let address = transport.start(runtime).await.unwrap().clone();

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, address.url().clone())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "");

    transport.shutdown();
}

#[tokio::test]
async fn test_options_custom_responder() {
    let (gate, calls) = common::counting_gate(ConnectionOptions::Refuse);
    let (runtime, _sessions) = common::recording_runtime();
    let transport = Transport::new(common::local_config())
        .with_gate(gate)
        .with_options_responder(|_: &RequestContext| -> Response {
            "{\"subprotocols\":[\"chat\"]}".into_response()
        });
    let address = transport.start(runtime).await.unwrap().clone();

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, address.url().join("/any/path").unwrap())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().await.unwrap(), "{\"subprotocols\":[\"chat\"]}");
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    transport.shutdown();
}

#[tokio::test]
async fn test_active_sessions_follow_runtime() {
    let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
    let done_rx = Arc::new(tokio::sync::Mutex::new(Some(done_rx)));
    let runtime = move |_session: ws_transport::Session| {
        let done_rx = Arc::clone(&done_rx);
        async move {
            if let Some(rx) = done_rx.lock().await.take() {
                let _ = rx.await;
            }
        }
    };

    let transport = Transport::new(common::local_config());
    let address = transport.start(runtime).await.unwrap().clone();
    let (_socket, _) = connect_async(common::ws_request(&address, None)).await.unwrap();

    wait_until(|| transport.active_sessions() == 1).await;
    done_tx.send(()).unwrap();
    wait_until(|| transport.active_sessions() == 0).await;

    transport.shutdown();
}

async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached");
}
