// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::Parser;

/// Coordinator that tracks connected agents and collects their files on demand.
#[derive(Debug, Clone, Parser)]
#[command(name = "pullhub", version, about)]
pub struct HubConfig {
    /// Host to bind on.
    #[arg(long, default_value = "0.0.0.0", env = "PULL_HUB_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PULL_HUB_PORT")]
    pub port: u16,

    /// Shared secret agents present as `Authorization: Bearer <secret>`.
    #[arg(long, env = "PULL_HUB_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: String,

    /// Directory received files are written into.
    #[arg(long, default_value = ".", env = "PULL_HUB_STORAGE_DIR")]
    pub storage_dir: PathBuf,

    /// File name prefix for received files.
    #[arg(long, default_value = "received_", env = "PULL_HUB_FILE_PREFIX")]
    pub file_prefix: String,

    /// File name suffix for received files.
    #[arg(long, default_value = ".txt", env = "PULL_HUB_FILE_SUFFIX")]
    pub file_suffix: String,

    /// Accept `/trigger` without a bearer token.
    #[arg(long, env = "PULL_HUB_OPEN_TRIGGER")]
    pub open_trigger: bool,

    /// Per-agent outbound command queue depth.
    #[arg(long, default_value_t = 16, env = "PULL_HUB_COMMAND_QUEUE")]
    pub command_queue: usize,

    /// Log level filter (e.g. `info`, `pullhub=debug`).
    #[arg(long, default_value = "info", env = "PULL_HUB_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (`text` or `json`).
    #[arg(long, default_value = "text", env = "PULL_HUB_LOG_FORMAT")]
    pub log_format: String,
}

impl HubConfig {
    /// Cross-field checks that clap cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.auth_token.is_empty() {
            anyhow::bail!("auth token must not be empty");
        }
        if self.command_queue == 0 {
            anyhow::bail!("command queue depth must be at least 1");
        }
        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("invalid log format: {other}"),
        }
        if self.file_prefix.contains('/') || self.file_suffix.contains('/') {
            anyhow::bail!("file prefix and suffix must not contain path separators");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
