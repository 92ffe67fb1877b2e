// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential gate shared by the control upgrade and transfer paths.

use std::fmt;

use axum::http::HeaderMap;

use crate::error::HubError;

/// Header carrying the agent identity on every control and transfer request.
pub const AGENT_ID_HEADER: &str = "x-client-id";

/// Constant-time string comparison to prevent timing side-channel attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut acc = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        acc |= x ^ y;
    }
    acc == 0
}

/// Validated agent identity.
///
/// Non-empty and usable as a single file-name component, since received
/// files are named after it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(String);

impl AgentId {
    pub fn parse(raw: &str) -> Result<Self, HubError> {
        if raw.is_empty() || raw == "." || raw == ".." {
            return Err(HubError::BadRequest);
        }
        if raw.chars().any(|c| c == '/' || c == '\\' || c == '\0') {
            return Err(HubError::BadRequest);
        }
        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Static shared-secret check.
#[derive(Clone)]
pub struct CredentialGate {
    secret: String,
}

impl fmt::Debug for CredentialGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialGate").finish_non_exhaustive()
    }
}

impl CredentialGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }

    /// Pure predicate: true only for an exact secret match and a non-empty identity.
    ///
    /// An empty configured secret never authorizes anything.
    pub fn authorize(&self, presented_secret: &str, presented_identity: &str) -> bool {
        !self.secret.is_empty()
            && constant_time_eq(presented_secret, &self.secret)
            && !presented_identity.is_empty()
    }

    /// Validate a `Bearer` token from HTTP headers.
    pub fn validate_bearer(&self, headers: &HeaderMap) -> Result<(), HubError> {
        let token = bearer_token(headers).ok_or(HubError::Unauthorized)?;
        if !self.secret.is_empty() && constant_time_eq(token, &self.secret) {
            Ok(())
        } else {
            Err(HubError::Unauthorized)
        }
    }

    /// Admit a request carrying both the bearer secret and the agent identity.
    ///
    /// The secret is checked first: a request with a wrong secret and no
    /// identity is `Unauthorized`, not `BadRequest`.
    pub fn admit(&self, headers: &HeaderMap) -> Result<AgentId, HubError> {
        self.validate_bearer(headers)?;
        let raw = headers
            .get(AGENT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(HubError::BadRequest)?;
        let id = AgentId::parse(raw)?;
        let token = bearer_token(headers).unwrap_or_default();
        if self.authorize(token, id.as_str()) {
            Ok(id)
        } else {
            Err(HubError::Unauthorized)
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers.get("authorization").and_then(|v| v.to_str().ok())?.strip_prefix("Bearer ")
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
