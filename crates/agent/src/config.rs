// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Agent that keeps a control channel open to a pullhub and uploads its file on request.
#[derive(Debug, Clone, Parser)]
#[command(name = "pullagent", version, about)]
pub struct AgentConfig {
    /// Hub control channel URL (e.g. `ws://hub:9900/ws`).
    #[arg(long, env = "PULL_AGENT_CONTROL_URL")]
    pub control_url: String,

    /// Hub upload URL (e.g. `http://hub:9900/upload`).
    #[arg(long, env = "PULL_AGENT_UPLOAD_URL")]
    pub upload_url: String,

    /// Identity this agent announces to the hub.
    #[arg(long, env = "PULL_AGENT_ID")]
    pub agent_id: String,

    /// Shared secret presented as a bearer token.
    #[arg(long, env = "PULL_AGENT_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: String,

    /// File uploaded on each `DOWNLOAD` command.
    #[arg(long, env = "PULL_AGENT_FILE")]
    pub file: PathBuf,

    /// Delay between reconnect attempts in milliseconds.
    #[arg(long, default_value_t = 5000, env = "PULL_AGENT_RECONNECT_MS")]
    pub reconnect_ms: u64,

    /// Control channel dial timeout in milliseconds.
    #[arg(long, default_value_t = 10000, env = "PULL_AGENT_CONNECT_TIMEOUT_MS")]
    pub connect_timeout_ms: u64,

    /// Log level filter (e.g. `info`, `pullagent=debug`).
    #[arg(long, default_value = "info", env = "PULL_AGENT_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (`text` or `json`).
    #[arg(long, default_value = "text", env = "PULL_AGENT_LOG_FORMAT")]
    pub log_format: String,
}

impl AgentConfig {
    /// Cross-field checks that clap cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agent_id.is_empty() {
            anyhow::bail!("agent id must not be empty");
        }
        if self.auth_token.is_empty() {
            anyhow::bail!("auth token must not be empty");
        }
        if !(self.control_url.starts_with("ws://") || self.control_url.starts_with("wss://")) {
            anyhow::bail!("control url must be ws:// or wss://: {}", self.control_url);
        }
        if !(self.upload_url.starts_with("http://") || self.upload_url.starts_with("https://")) {
            anyhow::bail!("upload url must be http:// or https://: {}", self.upload_url);
        }
        if self.reconnect_ms == 0 {
            anyhow::bail!("reconnect interval must be positive");
        }
        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        Ok(())
    }

    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}
