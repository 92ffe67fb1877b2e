// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Live registry of connected agents and their control-channel handles.
//!
//! The map lock is only held to mutate the map or to copy its handles.
//! Sends happen outside the lock and never block: a handle whose queue is
//! full or whose connection task is gone counts as a failed send and is
//! evicted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::command::Command;
use crate::gate::AgentId;

/// Why a non-blocking send to a control handle failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendFailure {
    /// The handle was closed (replaced, evicted, or its connection ended).
    Closed,
    /// The connection task is not draining its queue.
    Full,
}

impl std::fmt::Display for SendFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => f.write_str("channel closed"),
            Self::Full => f.write_str("channel full"),
        }
    }
}

/// Sending half of one agent's control channel.
///
/// The connection task owns the socket and drains the paired receiver;
/// closing the handle tells that task to shut the socket down.
pub struct ControlHandle {
    id: Uuid,
    tx: mpsc::Sender<Command>,
    closed: AtomicBool,
    cancel: CancellationToken,
}

impl ControlHandle {
    /// Create a handle and the receiver its connection task drains.
    pub fn new(capacity: usize) -> (Arc<Self>, mpsc::Receiver<Command>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = Arc::new(Self {
            id: Uuid::new_v4(),
            tx,
            closed: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        });
        (handle, rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue a command without waiting.
    pub fn try_send(&self, command: Command) -> Result<(), SendFailure> {
        if self.is_closed() {
            return Err(SendFailure::Closed);
        }
        self.tx.try_send(command).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendFailure::Full,
            mpsc::error::TrySendError::Closed(_) => SendFailure::Closed,
        })
    }

    /// Close the handle. Returns `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        let first = !self.closed.swap(true, Ordering::AcqRel);
        if first {
            self.cancel.cancel();
        }
        first
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.tx.is_closed()
    }

    /// Resolves once the handle is closed.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Identities a send was attempted on.
    pub addressed: usize,
    /// Identities whose send failed and were evicted.
    pub evicted: Vec<AgentId>,
}

/// Agent identity → live control handle.
#[derive(Default)]
pub struct AgentRegistry {
    agents: Mutex<HashMap<AgentId, Arc<ControlHandle>>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handle` for `id`, closing any handle it replaces.
    pub fn register(&self, id: AgentId, handle: Arc<ControlHandle>) -> Option<Arc<ControlHandle>> {
        let replaced = self.agents.lock().insert(id.clone(), handle);
        if let Some(ref old) = replaced {
            old.close();
            info!(agent_id = %id, "agent reconnected, previous control channel closed");
        } else {
            info!(agent_id = %id, "agent connected");
        }
        replaced
    }

    /// Send `command` to every registered agent.
    pub fn broadcast(&self, command: Command) -> BroadcastReport {
        let targets: Vec<(AgentId, Arc<ControlHandle>)> = {
            let agents = self.agents.lock();
            agents.iter().map(|(id, handle)| (id.clone(), Arc::clone(handle))).collect()
        };

        let mut failed = Vec::new();
        for (id, handle) in &targets {
            match handle.try_send(command) {
                Ok(()) => debug!(agent_id = %id, %command, "command queued"),
                Err(e) => {
                    warn!(agent_id = %id, %command, err = %e, "command send failed, evicting");
                    failed.push((id.clone(), Arc::clone(handle)));
                }
            }
        }

        let mut evicted = Vec::with_capacity(failed.len());
        for (id, handle) in failed {
            self.evict(&id, &handle);
            evicted.push(id);
        }

        BroadcastReport { addressed: targets.len(), evicted }
    }

    /// Remove `id` if it still maps to `handle`, and close `handle`.
    ///
    /// A newer handle registered for the same identity is left untouched.
    pub fn evict(&self, id: &AgentId, handle: &Arc<ControlHandle>) -> bool {
        let removed = {
            let mut agents = self.agents.lock();
            match agents.get(id) {
                Some(current) if Arc::ptr_eq(current, handle) => agents.remove(id).is_some(),
                _ => false,
            }
        };
        if handle.close() && removed {
            info!(agent_id = %id, "agent disconnected");
        }
        removed
    }

    /// Point-in-time view of registered identities, sorted.
    pub fn snapshot(&self) -> Vec<AgentId> {
        let mut ids: Vec<AgentId> = self.agents.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.agents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop and close every handle.
    pub fn close_all(&self) {
        let drained: Vec<_> = self.agents.lock().drain().collect();
        for (_, handle) in drained {
            handle.close();
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
