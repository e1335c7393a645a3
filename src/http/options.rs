//! `OPTIONS` discovery requests.

use std::sync::Arc;

use axum::response::Response;

use crate::hooks::OptionsResponder;
use crate::http::RequestContext;
use crate::observability::metrics;

/// Answer a discovery request. Independent of the upgrade path and of shutdown.
pub fn respond(responder: &Arc<dyn OptionsResponder>, context: &RequestContext) -> Response {
    metrics::record_options_request();
    tracing::trace!(path = %context.path(), "Answering OPTIONS request");
    responder.respond(context)
}
