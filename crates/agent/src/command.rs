// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Text frame from the hub that asks for an upload.
pub const DOWNLOAD_SENTINEL: &str = "DOWNLOAD";

/// Commands understood on the control channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Download,
}

impl Command {
    /// Parse a text frame. Anything but an exact sentinel match is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            DOWNLOAD_SENTINEL => Some(Self::Download),
            _ => None,
        }
    }
}
