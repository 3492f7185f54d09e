// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Errors surfaced to dashboard code by [`crate::ApiClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The session could not be restored: refresh failed, or the retried
    /// request came back 401 again. Terminal until the user logs in again.
    #[error("session expired, re-authentication required")]
    Unauthorized,

    /// Transport-level failure (connect, DNS, body read).
    #[error("request failed: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },

    /// Client misconfiguration (bad base URL, header construction).
    #[error("client configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Short machine-readable code, mirrored by the dashboard.
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Unauthorized => "AUTH_EXPIRED",
            ClientError::Transport { .. } => "TRANSPORT_ERROR",
            ClientError::Config(_) => "CONFIG_ERROR",
        }
    }
}
