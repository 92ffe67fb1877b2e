// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pullagent: holds a control channel to a pullhub and uploads a file on command.

pub mod command;
pub mod config;
pub mod connector;
pub mod error;
pub mod session;
pub mod transfer;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::AgentConfig;
use crate::connector::WsConnector;
use crate::session::{Backoff, ControlSession};
use crate::transfer::Uploader;

/// Build the control session described by `config`.
pub fn build_session(config: &AgentConfig) -> ControlSession {
    let connector = WsConnector::new(
        config.control_url.clone(),
        config.agent_id.clone(),
        config.auth_token.clone(),
        config.connect_timeout(),
    );
    let uploader = Uploader::new(
        config.upload_url.clone(),
        config.agent_id.clone(),
        config.auth_token.clone(),
        config.file.clone(),
    );
    ControlSession::new(
        config.agent_id.clone(),
        Arc::new(connector),
        Arc::new(uploader),
        Backoff::fixed(config.reconnect_interval()),
    )
}

/// Run the agent until `shutdown` is cancelled.
pub async fn run(config: AgentConfig, shutdown: CancellationToken) -> anyhow::Result<()> {
    tracing::info!(
        agent_id = %config.agent_id,
        hub = %config.control_url,
        file = %config.file.display(),
        "pullagent starting"
    );
    build_session(&config).run(shutdown).await;
    Ok(())
}
