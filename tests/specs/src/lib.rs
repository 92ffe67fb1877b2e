// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end tests.
//!
//! Runs a real hub on a loopback TCP port and real agents against it, all
//! inside the test process.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use pullagent::config::AgentConfig;
use pullagent::session::SessionState;
use pullhub::config::HubConfig;
use pullhub::state::HubState;

pub const SECRET: &str = "e2e-secret";

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// Poll `check` until it returns true or `timeout` passes.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> anyhow::Result<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return Ok(());
        }
        if tokio::time::Instant::now() > deadline {
            anyhow::bail!("condition not met within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// A hub serving on loopback, shut down on drop.
pub struct HubProcess {
    pub state: Arc<HubState>,
    pub port: u16,
    storage: tempfile::TempDir,
    task: Option<JoinHandle<anyhow::Result<()>>>,
}

impl HubProcess {
    /// Start a hub on an ephemeral port.
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_on(0).await
    }

    /// Start a hub on `port` (0 picks one).
    pub async fn start_on(port: u16) -> anyhow::Result<Self> {
        let storage = tempfile::tempdir()?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let port = listener.local_addr()?.port();

        let config = HubConfig {
            host: "127.0.0.1".into(),
            port,
            auth_token: SECRET.into(),
            storage_dir: storage.path().to_path_buf(),
            file_prefix: "received_".into(),
            file_suffix: ".txt".into(),
            open_trigger: false,
            command_queue: 4,
            log_level: "info".into(),
            log_format: "text".into(),
        };
        let state = Arc::new(HubState::new(config, CancellationToken::new()));
        let task = tokio::spawn(pullhub::serve(listener, Arc::clone(&state)));
        Ok(Self { state, port, storage, task: Some(task) })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn storage(&self) -> &Path {
        self.storage.path()
    }

    /// Connected agent ids.
    pub fn agents(&self) -> Vec<String> {
        self.state.registry.snapshot().iter().map(ToString::to_string).collect()
    }

    /// `POST /trigger` with the shared secret; returns the JSON acknowledgment.
    pub async fn trigger(&self) -> anyhow::Result<serde_json::Value> {
        pullagent::transfer::ensure_crypto();
        let resp = reqwest::Client::new()
            .post(format!("{}/trigger", self.base_url()))
            .bearer_auth(SECRET)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    /// Stop serving and wait for the server task.
    pub async fn stop(mut self) -> anyhow::Result<()> {
        self.state.shutdown.cancel();
        if let Some(task) = self.task.take() {
            task.await??;
        }
        Ok(())
    }
}

impl Drop for HubProcess {
    fn drop(&mut self) {
        self.state.shutdown.cancel();
    }
}

/// Agent configuration pointing at a hub on `port`.
pub fn agent_config(port: u16, agent_id: &str, secret: &str, file: PathBuf) -> AgentConfig {
    AgentConfig {
        control_url: format!("ws://127.0.0.1:{port}/ws"),
        upload_url: format!("http://127.0.0.1:{port}/upload"),
        agent_id: agent_id.into(),
        auth_token: secret.into(),
        file,
        reconnect_ms: 100,
        connect_timeout_ms: 2000,
        log_level: "info".into(),
        log_format: "text".into(),
    }
}

/// A running agent session, stopped on drop.
pub struct AgentProcess {
    pub states: tokio::sync::watch::Receiver<SessionState>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AgentProcess {
    pub fn start(config: &AgentConfig) -> Self {
        let session = pullagent::build_session(config);
        let states = session.subscribe();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(session.run(shutdown.clone()));
        Self { states, shutdown, task: Some(task) }
    }

    pub fn state(&self) -> SessionState {
        *self.states.borrow()
    }

    pub async fn stop(mut self) -> anyhow::Result<()> {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            task.await?;
        }
        Ok(())
    }
}

impl Drop for AgentProcess {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
