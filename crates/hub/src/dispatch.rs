// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast trigger: ask every connected agent to upload its file.

use serde::Serialize;
use tracing::info;

use crate::command::Command;
use crate::registry::AgentRegistry;

/// Acknowledgment that a trigger was issued.
///
/// `addressed` counts send attempts, not deliveries: the control channel
/// carries no acknowledgment back from agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerAck {
    pub message: &'static str,
    pub addressed: usize,
}

pub const TRIGGER_ACK: &str = "trigger sent";

/// Broadcast [`Command::Download`] to all registered agents and return immediately.
pub fn trigger_download(registry: &AgentRegistry) -> TriggerAck {
    let report = registry.broadcast(Command::Download);
    info!(addressed = report.addressed, evicted = report.evicted.len(), "download trigger sent");
    TriggerAck { message: TRIGGER_ACK, addressed: report.addressed }
}
