// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer receiver: agents push their file here after a `DOWNLOAD` command.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::{error, info, warn};

use crate::error::HubError;
use crate::state::HubState;
use crate::store::StoreError;

/// `POST /upload`: raw file bytes from one agent.
///
/// Credentials and identity are checked before any body bytes are read.
pub async fn upload(State(s): State<Arc<HubState>>, headers: HeaderMap, body: Body) -> Response {
    let id = match s.gate.admit(&headers) {
        Ok(id) => id,
        Err(code) => {
            warn!(code = %code, "upload rejected");
            return code.to_http_response(code.gate_message());
        }
    };

    match s.store.persist(&id, body.into_data_stream()).await {
        Ok(bytes) => {
            info!(agent_id = %id, bytes, "file received");
            StatusCode::OK.into_response()
        }
        Err(e @ StoreError::Create(_)) => {
            error!(agent_id = %id, err = %e, "upload destination unavailable");
            HubError::Internal.to_http_response("file error")
        }
        Err(e @ StoreError::Stream(_)) => {
            warn!(agent_id = %id, err = %e, "upload aborted, previous file kept");
            HubError::BadRequest.to_http_response("upload stream failed")
        }
        Err(e @ StoreError::Write(_)) => {
            error!(agent_id = %id, err = %e, "upload write failed, previous file kept");
            HubError::Internal.to_http_response("file error")
        }
    }
}
