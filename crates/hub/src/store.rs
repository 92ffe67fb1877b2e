// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk destination for received files.
//!
//! Each agent has one destination, `<dir>/<prefix><agent_id><suffix>`.
//! Uploads are written to a hidden temporary file in the same directory first and renamed over the
//! destination once the stream completes, so a failed upload leaves the
//! previous artifact untouched.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;

use crate::gate::AgentId;

/// Failure while persisting an upload.
#[derive(Debug)]
pub enum StoreError {
    /// The temporary file could not be created.
    Create(std::io::Error),
    /// The incoming stream failed before completion.
    Stream(String),
    /// Writing or finalising the file failed.
    Write(std::io::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(e) => write!(f, "failed to create destination: {e}"),
            Self::Stream(e) => write!(f, "upload stream failed: {e}"),
            Self::Write(e) => write!(f, "failed to write destination: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Writes received files into a directory, one file per agent.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    prefix: String,
    suffix: String,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self { dir: dir.into(), prefix: prefix.into(), suffix: suffix.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Destination path for `id`.
    pub fn destination(&self, id: &AgentId) -> PathBuf {
        self.dir.join(format!("{}{}{}", self.prefix, id, self.suffix))
    }

    /// Temporary file for one upload, named independently of the agent id.
    fn partial_path(&self) -> PathBuf {
        self.dir.join(format!(".{}.partial", uuid::Uuid::new_v4().simple()))
    }

    /// Copy `body` into the destination for `id`, replacing prior content.
    ///
    /// Returns the number of bytes written.
    pub async fn persist<S, E>(&self, id: &AgentId, body: S) -> Result<u64, StoreError>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: fmt::Display,
    {
        let partial = self.partial_path();
        let file = tokio::fs::File::create(&partial).await.map_err(StoreError::Create)?;

        match copy_stream(file, body).await {
            Ok(written) => {
                if let Err(e) = tokio::fs::rename(&partial, self.destination(id)).await {
                    let _ = tokio::fs::remove_file(&partial).await;
                    return Err(StoreError::Write(e));
                }
                Ok(written)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }
}

async fn copy_stream<S, E>(mut file: tokio::fs::File, mut body: S) -> Result<u64, StoreError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: fmt::Display,
{
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| StoreError::Stream(e.to_string()))?;
        file.write_all(&chunk).await.map_err(StoreError::Write)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(StoreError::Write)?;
    file.sync_all().await.map_err(StoreError::Write)?;
    Ok(written)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
