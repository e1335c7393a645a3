//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the single dispatch handler
//! - Wire up middleware (tracing, request deadline)
//! - Dispatch `OPTIONS` to the responder and everything else to the upgrade gate

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        Request, State,
    },
    http::{Method, StatusCode},
    response::Response,
    Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::hooks::OptionsResponder;
use crate::http::options;
use crate::http::request::RequestContext;
use crate::http::websocket::UpgradeGate;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upgrade: UpgradeGate,
    pub options: Arc<dyn OptionsResponder>,
}

/// Build the Axum router with all middleware layers.
///
/// Every path is served; the transport does not route.
pub fn build_router(state: AppState, read_timeout: Option<Duration>) -> Router {
    let router = Router::new().fallback(dispatch).with_state(state);

    let router = match read_timeout {
        Some(timeout) => router.layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

async fn dispatch(
    State(state): State<AppState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    request: Request,
) -> Response {
    let context = RequestContext::from_request(&request);

    if context.method() == Method::OPTIONS {
        return options::respond(&state.options, &context);
    }

    state.upgrade.handle(context, upgrade).await
}
