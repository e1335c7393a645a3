//! WebSocket transport server (v1)
//!
//! Serves the transport with an echo runtime: every upgraded session gets its
//! text and binary messages sent back until it closes or the server stops.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client                 ┌──────────────────────────────────────────────┐
//!     ───────────────────────┼─▶ keep-alive ─▶ (rustls) ─▶ axum dispatch    │
//!                            │    acceptor       acceptor      │            │
//!                            │                                 ├─ OPTIONS ─▶ responder
//!                            │                                 │            │
//!                            │                                 └─ upgrade gate
//!                            │                                      │ shutdown? hook? handshake
//!                            │                                      ▼       │
//!                            │                              session runtime │
//!                            └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::extract::ws::Message;
use axum::response::{IntoResponse, Json, Response};
use clap::Parser;
use serde_json::json;

use ws_transport::config::load_config;
use ws_transport::lifecycle::signals::shutdown_signal;
use ws_transport::observability::{logging, metrics};
use ws_transport::{RequestContext, Session, Transport, TransportConfig};

#[derive(Parser)]
#[command(name = "ws-transport")]
#[command(about = "HTTP to WebSocket transport with an echo session runtime", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.host`.
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => TransportConfig::default(),
    };
    if let Some(host) = cli.host {
        config.listener.host = host;
    }

    logging::init_logging(&config.observability);
    tracing::info!("ws-transport v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let subprotocols = config.connection.subprotocols.clone();
    let transport = Transport::new(config).with_options_responder(
        move |_request: &RequestContext| -> Response {
            Json(json!({
                "transport": "websocket",
                "version": env!("CARGO_PKG_VERSION"),
                "subprotocols": subprotocols,
            }))
            .into_response()
        },
    );

    let address = transport.start(echo).await?;
    tracing::info!(address = %address.websocket_url(), "Accepting sessions");

    let waiter = transport.wait();
    tokio::pin!(waiter);

    tokio::select! {
        result = &mut waiter => result?,
        _ = shutdown_signal() => {
            transport.shutdown();
            waiter.await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Echo runtime: mirrors data frames until the peer leaves or shutdown begins.
async fn echo(mut session: Session) {
    let id = session.id();
    let shutdown = session.shutdown().clone();
    tracing::debug!(
        connection_id = %id,
        protocol = ?session.protocol(),
        user_agent = ?session.user_agent(),
        "Session started"
    );

    loop {
        tokio::select! {
            _ = shutdown.triggered() => {
                let _ = session.socket_mut().send(Message::Close(None)).await;
                break;
            }
            message = session.socket_mut().recv() => match message {
                Some(Ok(message @ (Message::Text(_) | Message::Binary(_)))) => {
                    if session.socket_mut().send(message).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    tracing::debug!(connection_id = %id, error = %error, "Session read failed");
                    break;
                }
            }
        }
    }

    tracing::debug!(connection_id = %id, "Session ended");
}
