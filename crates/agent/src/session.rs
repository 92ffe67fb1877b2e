// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control session: keeps one control channel to the hub alive forever.
//!
//! ```text
//! Disconnected --backoff--> Connecting --dial ok--> Connected
//!      ^                        |                       |
//!      +------- dial failed ----+------ read error -----+
//! ```
//!
//! Transitions are pure ([`SessionState::on`]) and the delay before each
//! dial comes from [`Backoff::delay_before`], so both are testable without a
//! network. Time is the tokio clock, which tests pause.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::connector::{Connector, ControlStream, Inbound};
use crate::error::AgentError;
use crate::transfer::Transfer;

/// Where the session is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not connected. `failures` counts dial or read failures since the last
    /// successful dial; zero only before the very first attempt.
    Disconnected { failures: u32 },
    /// Dialing the hub.
    Connecting { failures: u32 },
    /// Control channel established; blocked on the next inbound frame.
    Connected,
}

/// Inputs that move the session between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    BackoffElapsed,
    DialSucceeded,
    DialFailed,
    ReceiveFailed,
}

impl SessionState {
    pub const INITIAL: Self = Self::Disconnected { failures: 0 };

    /// Next state after `event`. Events that do not apply leave the state as is.
    pub fn on(self, event: SessionEvent) -> Self {
        match (self, event) {
            (Self::Disconnected { failures }, SessionEvent::BackoffElapsed) => {
                Self::Connecting { failures }
            }
            (Self::Connecting { .. }, SessionEvent::DialSucceeded) => Self::Connected,
            (Self::Connecting { failures }, SessionEvent::DialFailed) => {
                Self::Disconnected { failures: failures.saturating_add(1) }
            }
            (Self::Connected, SessionEvent::ReceiveFailed) => Self::Disconnected { failures: 1 },
            (state, _) => state,
        }
    }
}

/// Constant reconnect delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    interval: Duration,
}

impl Backoff {
    pub fn fixed(interval: Duration) -> Self {
        Self { interval }
    }

    /// How long to wait in `state` before moving on.
    ///
    /// Only `Disconnected` after at least one failure waits; the first dial
    /// is immediate.
    pub fn delay_before(&self, state: SessionState) -> Duration {
        match state {
            SessionState::Disconnected { failures } if failures > 0 => self.interval,
            _ => Duration::ZERO,
        }
    }
}

/// What the receive loop does with one text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StartTransfer,
    Ignore,
}

/// Map an inbound text frame to an action.
pub fn action_for(text: &str) -> Action {
    match Command::parse(text) {
        Some(Command::Download) => Action::StartTransfer,
        None => Action::Ignore,
    }
}

/// Clears the in-flight flag when a transfer task ends, however it ends.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One agent's control session.
pub struct ControlSession {
    agent_id: String,
    connector: Arc<dyn Connector>,
    transfer: Arc<dyn Transfer>,
    backoff: Backoff,
    in_flight: Arc<AtomicBool>,
    state_tx: watch::Sender<SessionState>,
}

impl ControlSession {
    pub fn new(
        agent_id: String,
        connector: Arc<dyn Connector>,
        transfer: Arc<dyn Transfer>,
        backoff: Backoff,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::INITIAL);
        Self {
            agent_id,
            connector,
            transfer,
            backoff,
            in_flight: Arc::new(AtomicBool::new(false)),
            state_tx,
        }
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Run until `shutdown` is cancelled. Never returns otherwise.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut state = SessionState::INITIAL;
        let mut channel: Option<ControlStream> = None;

        loop {
            self.state_tx.send_replace(state);

            state = match state {
                SessionState::Disconnected { .. } => {
                    let delay = self.backoff.delay_before(state);
                    if !delay.is_zero() {
                        tokio::select! {
                            _ = shutdown.cancelled() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                    state.on(SessionEvent::BackoffElapsed)
                }
                SessionState::Connecting { failures } => {
                    let dialed = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        dialed = self.connector.connect() => dialed,
                    };
                    match dialed {
                        Ok(stream) => {
                            info!(agent_id = %self.agent_id, "connected to hub");
                            channel = Some(stream);
                            state.on(SessionEvent::DialSucceeded)
                        }
                        Err(e) => {
                            warn!(
                                agent_id = %self.agent_id,
                                attempt = failures + 1,
                                err = %e,
                                "control connect failed, retrying in {:?}",
                                self.backoff.interval,
                            );
                            state.on(SessionEvent::DialFailed)
                        }
                    }
                }
                SessionState::Connected => match channel.take() {
                    Some(stream) => match self.receive(stream, &shutdown).await {
                        Some(e) => {
                            warn!(
                                agent_id = %self.agent_id,
                                err = %e,
                                "control channel lost, reconnecting"
                            );
                            state.on(SessionEvent::ReceiveFailed)
                        }
                        None => break,
                    },
                    None => state.on(SessionEvent::ReceiveFailed),
                },
            };
        }

        debug!(agent_id = %self.agent_id, "control session stopped");
    }

    /// Receive loop for one established channel.
    ///
    /// Returns the error that ended the channel, or `None` on shutdown. The
    /// stream is dropped on return, closing the channel.
    async fn receive(
        &self,
        mut stream: ControlStream,
        shutdown: &CancellationToken,
    ) -> Option<AgentError> {
        loop {
            let frame = tokio::select! {
                _ = shutdown.cancelled() => return None,
                frame = stream.next() => frame,
            };
            match frame {
                Some(Ok(Inbound::Text(text))) => match action_for(&text) {
                    Action::StartTransfer => {
                        info!(agent_id = %self.agent_id, "download command received");
                        self.start_transfer();
                    }
                    Action::Ignore => {
                        debug!(agent_id = %self.agent_id, len = text.len(), "ignoring message");
                    }
                },
                Some(Ok(Inbound::Other)) => {}
                Some(Ok(Inbound::Close)) | None => {
                    return Some(AgentError::Receive("closed by hub".to_owned()));
                }
                Some(Err(e)) => return Some(e),
            }
        }
    }

    /// Fire-and-forget upload. A trigger that arrives while one is running is skipped.
    fn start_transfer(&self) {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            info!(agent_id = %self.agent_id, "upload already in flight, skipping");
            return;
        }
        let guard = InFlight(Arc::clone(&self.in_flight));
        let transfer = Arc::clone(&self.transfer);
        let agent_id = self.agent_id.clone();

        tokio::spawn(async move {
            let _guard = guard;
            match transfer.upload().await {
                Ok(bytes) => info!(agent_id = %agent_id, bytes, "file uploaded"),
                Err(e) => warn!(agent_id = %agent_id, err = %e, "upload failed"),
            }
        });
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
