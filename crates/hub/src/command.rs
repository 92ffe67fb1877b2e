// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Text frame that asks an agent to upload its file.
pub const DOWNLOAD_SENTINEL: &str = "DOWNLOAD";

/// Commands the hub pushes down a control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Download,
}

impl Command {
    /// Wire form of the command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Download => DOWNLOAD_SENTINEL,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
