// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::state::HubState;

/// Axum middleware that enforces Bearer token authentication on operator routes.
///
/// Exempt: `/api/v1/health`, plus `/ws` and `/upload`, whose handlers run the
/// full credential gate themselves. `/trigger` is exempt only when the hub
/// runs with `--open-trigger`.
pub async fn auth_layer(
    state: State<Arc<HubState>>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let path = req.uri().path();

    if path == "/api/v1/health"
        || path == "/ws"
        || path == "/upload"
        || (path == "/trigger" && state.config.open_trigger)
    {
        return next.run(req).await;
    }

    if let Err(code) = state.gate.validate_bearer(req.headers()) {
        return code.to_http_response("unauthorized");
    }

    next.run(req).await
}
