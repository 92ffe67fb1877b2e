// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pullhub: tracks connected agents and collects their files on demand.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod registry;
pub mod state;
pub mod store;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::config::HubConfig;
use crate::state::HubState;
use crate::transport::build_router;

/// Run the hub until Ctrl-C.
pub async fn run(config: HubConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let shutdown = CancellationToken::new();

    tokio::fs::create_dir_all(&config.storage_dir).await?;
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(storage = %config.storage_dir.display(), "pullhub listening on {addr}");

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
                shutdown.cancel();
            }
        });
    }

    let state = Arc::new(HubState::new(config, shutdown));
    serve(listener, state).await
}

/// Serve the hub routes on an already-bound listener until `state.shutdown` fires.
pub async fn serve(listener: TcpListener, state: Arc<HubState>) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let router = build_router(Arc::clone(&state));
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;
    state.registry.close_all();
    Ok(())
}
