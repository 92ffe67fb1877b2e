// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

/// Failures on the agent side. None of them are fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// Dialing or upgrading the control channel failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Reading from an established control channel failed or it was closed.
    #[error("receive failed: {0}")]
    Receive(String),

    /// The local file could not be opened for upload.
    #[error("cannot open {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The upload request failed in flight.
    #[error("upload failed: {0}")]
    Transfer(#[from] reqwest::Error),

    /// The hub answered the upload with a non-success status.
    #[error("upload rejected with status {0}")]
    Rejected(u16),
}
