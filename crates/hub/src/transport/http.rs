// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP handlers for operators.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::dispatch::trigger_download;
use crate::state::HubState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub agent_count: usize,
}

#[derive(Debug, Serialize)]
pub struct AgentInfo {
    pub id: String,
}

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<HubState>>) -> impl IntoResponse {
    Json(HealthResponse { status: "running".to_owned(), agent_count: s.registry.len() })
}

/// `GET /api/v1/agents`: currently connected agents.
pub async fn list_agents(State(s): State<Arc<HubState>>) -> impl IntoResponse {
    let agents: Vec<AgentInfo> =
        s.registry.snapshot().into_iter().map(|id| AgentInfo { id: id.to_string() }).collect();
    Json(agents)
}

/// `/trigger` (any method): ask every connected agent to upload now.
pub async fn trigger(State(s): State<Arc<HubState>>) -> impl IntoResponse {
    Json(trigger_download(&s.registry))
}
