// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Rejections the hub answers agents and operators with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubError {
    /// Missing or wrong shared secret.
    Unauthorized,
    /// Missing or unusable agent identity, or an aborted upload stream.
    BadRequest,
    /// The received file could not be stored.
    Internal,
}

impl HubError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::BadRequest => "BAD_REQUEST",
            Self::Internal => "INTERNAL",
        }
    }

    /// Message used when a gate rejection needs no further detail.
    pub fn gate_message(&self) -> &'static str {
        match self {
            Self::BadRequest => "missing or invalid agent id",
            Self::Unauthorized | Self::Internal => "unauthorized",
        }
    }

    pub fn to_http_response(&self, message: impl Into<String>) -> Response {
        let body = ErrorResponse {
            error: ErrorBody { code: self.as_str(), message: message.into() },
        };
        (self.status(), Json(body)).into_response()
    }
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{"error":{"code":..,"message":..}}`
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}
