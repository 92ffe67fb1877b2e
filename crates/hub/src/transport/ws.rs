// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control channel: one long-lived WebSocket per agent.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::command::Command;
use crate::gate::AgentId;
use crate::registry::ControlHandle;
use crate::state::HubState;

/// `GET /ws`: control channel upgrade.
///
/// Credential and identity are checked before the upgrade is accepted.
pub async fn control_handler(
    State(state): State<Arc<HubState>>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let id = match state.gate.admit(&headers) {
        Ok(id) => id,
        Err(code) => {
            tracing::warn!(code = %code, "control upgrade rejected");
            return code.to_http_response(code.gate_message());
        }
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    ws.on_failed_upgrade(|e| tracing::warn!(err = %e, "control upgrade failed"))
        .on_upgrade(move |socket| {
            let (handle, rx) = ControlHandle::new(state.config.command_queue);
            state.registry.register(id.clone(), Arc::clone(&handle));
            handle_control(socket, state, id, handle, rx)
        })
        .into_response()
}

/// Per-connection task: forwards queued commands and watches for disconnect.
///
/// Agents never send application messages; inbound text is logged and dropped.
async fn handle_control(
    socket: WebSocket,
    state: Arc<HubState>,
    id: AgentId,
    handle: Arc<ControlHandle>,
    mut rx: mpsc::Receiver<Command>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            _ = handle.closed() => break,
            _ = state.shutdown.cancelled() => break,

            cmd = rx.recv() => {
                let Some(cmd) = cmd else { break };
                if let Err(e) = ws_tx.send(Message::Text(cmd.as_str().to_owned().into())).await {
                    tracing::warn!(agent_id = %id, err = %e, "control write failed, evicting");
                    break;
                }
                tracing::info!(agent_id = %id, command = %cmd, "command sent");
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!(agent_id = %id, len = text.len(), "ignoring agent message");
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(agent_id = %id, err = %e, "control read error");
                        break;
                    }
                    _ => {} // ping/pong/binary ignored
                }
            }
        }
    }

    state.registry.evict(&id, &handle);
    let _ = ws_tx.send(Message::Close(None)).await;
}
