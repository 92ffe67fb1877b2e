// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dialing the hub's control channel.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use crate::error::AgentError;

/// Header carrying the agent identity on control and transfer requests.
pub const AGENT_ID_HEADER: &str = "x-client-id";

/// A frame received on the control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text(String),
    /// The hub closed the channel.
    Close,
    /// Binary, ping, pong: nothing the session acts on.
    Other,
}

/// Inbound half of an established control channel.
pub type ControlStream = Pin<Box<dyn Stream<Item = Result<Inbound, AgentError>> + Send>>;

/// Opens control channels.
///
/// Object-safe so the session can run against a fake in tests.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self) -> Pin<Box<dyn Future<Output = Result<ControlStream, AgentError>> + Send + '_>>;
}

/// WebSocket connector announcing identity and credential in the upgrade headers.
pub struct WsConnector {
    url: String,
    agent_id: String,
    auth_token: String,
    timeout: Duration,
}

impl WsConnector {
    pub fn new(url: String, agent_id: String, auth_token: String, timeout: Duration) -> Self {
        Self { url, agent_id, auth_token, timeout }
    }

    async fn dial(&self) -> Result<ControlStream, AgentError> {
        let mut request =
            self.url.as_str().into_client_request().map_err(|e| AgentError::Connect(e.to_string()))?;
        let headers = request.headers_mut();
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", self.auth_token))
                .map_err(|e| AgentError::Connect(format!("invalid auth token: {e}")))?,
        );
        headers.insert(
            AGENT_ID_HEADER,
            HeaderValue::from_str(&self.agent_id)
                .map_err(|e| AgentError::Connect(format!("invalid agent id: {e}")))?,
        );

        let (ws_stream, _) =
            tokio::time::timeout(self.timeout, tokio_tungstenite::connect_async(request))
                .await
                .map_err(|_| AgentError::Connect(format!("timed out after {:?}", self.timeout)))?
                .map_err(|e| AgentError::Connect(e.to_string()))?;

        let stream = ws_stream.map(|msg| match msg {
            Ok(Message::Text(text)) => Ok(Inbound::Text(text.to_string())),
            Ok(Message::Close(_)) => Ok(Inbound::Close),
            Ok(_) => Ok(Inbound::Other),
            Err(e) => Err(AgentError::Receive(e.to_string())),
        });
        Ok(Box::pin(stream))
    }
}

impl Connector for WsConnector {
    fn connect(&self) -> Pin<Box<dyn Future<Output = Result<ControlStream, AgentError>> + Send + '_>> {
        Box::pin(self.dial())
    }
}
