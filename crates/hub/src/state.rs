// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tokio_util::sync::CancellationToken;

use crate::config::HubConfig;
use crate::gate::CredentialGate;
use crate::registry::AgentRegistry;
use crate::store::FileStore;

/// Shared hub state.
pub struct HubState {
    pub registry: AgentRegistry,
    pub gate: CredentialGate,
    pub store: FileStore,
    pub config: HubConfig,
    pub shutdown: CancellationToken,
}

impl HubState {
    pub fn new(config: HubConfig, shutdown: CancellationToken) -> Self {
        Self {
            registry: AgentRegistry::new(),
            gate: CredentialGate::new(config.auth_token.clone()),
            store: FileStore::new(
                config.storage_dir.clone(),
                config.file_prefix.clone(),
                config.file_suffix.clone(),
            ),
            config,
            shutdown,
        }
    }
}
