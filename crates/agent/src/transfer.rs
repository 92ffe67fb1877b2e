// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer initiator: streams the configured file to the hub.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};

use futures_util::StreamExt;
use tokio_util::io::ReaderStream;

use crate::connector::AGENT_ID_HEADER;
use crate::error::AgentError;

static CRYPTO_INIT: Once = Once::new();

/// Install the ring crypto provider for reqwest/rustls.
/// Safe to call multiple times; only the first call has effect.
pub fn ensure_crypto() {
    CRYPTO_INIT.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

/// Uploads one file. Object-safe so the session can be tested without HTTP.
pub trait Transfer: Send + Sync + 'static {
    /// Upload the file, returning the number of bytes actually streamed.
    fn upload(&self) -> Pin<Box<dyn Future<Output = Result<u64, AgentError>> + Send + '_>>;
}

/// HTTP uploader: `POST` the raw file with identity and credential headers.
pub struct Uploader {
    url: String,
    agent_id: String,
    auth_token: String,
    path: PathBuf,
    client: reqwest::Client,
}

impl Uploader {
    pub fn new(url: String, agent_id: String, auth_token: String, path: PathBuf) -> Self {
        ensure_crypto();
        Self { url, agent_id, auth_token, path, client: reqwest::Client::new() }
    }

    async fn send(&self) -> Result<u64, AgentError> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|source| AgentError::FileAccess { path: self.path.clone(), source })?;

        let sent = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&sent);
        let chunks = ReaderStream::new(file).inspect(move |chunk| {
            if let Ok(chunk) = chunk {
                counter.fetch_add(chunk.len() as u64, Ordering::Relaxed);
            }
        });
        let body = reqwest::Body::wrap_stream(chunks);
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.auth_token)
            .header(AGENT_ID_HEADER, &self.agent_id)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AgentError::Rejected(status.as_u16()));
        }
        Ok(sent.load(Ordering::Relaxed))
    }
}

impl Transfer for Uploader {
    fn upload(&self) -> Pin<Box<dyn Future<Output = Result<u64, AgentError>> + Send + '_>> {
        Box::pin(self.send())
    }
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod tests;
