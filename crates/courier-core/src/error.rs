// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier relay.

use thiserror::Error;

/// The primary error type used across all Courier components.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Session lifecycle errors (unknown session, invalid state for the operation).
    #[error("session error: {0}")]
    Session(String),

    /// A caller-supplied session identifier was absent or blank.
    ///
    /// Rejected before any provider interaction.
    #[error("missing or empty sessionId")]
    MissingSessionId,

    /// The requested platform has no registered provider connection.
    #[error("no provider registered for platform `{platform}`")]
    ProviderUnavailable { platform: String },

    /// Platform provider errors (automation client failure, listener setup).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Broadcast hub or transport errors (bind failure, serialization).
    #[error("hub error: {message}")]
    Hub {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Short machine-readable code, used by the HTTP surface.
    pub fn code(&self) -> &'static str {
        match self {
            CourierError::Config(_) => "CONFIG_ERROR",
            CourierError::Storage { .. } => "STORAGE_ERROR",
            CourierError::Session(_) => "SESSION_ERROR",
            CourierError::MissingSessionId => "MISSING_SESSION_ID",
            CourierError::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            CourierError::Provider { .. } => "PROVIDER_ERROR",
            CourierError::Hub { .. } => "HUB_ERROR",
            CourierError::Timeout { .. } => "TIMEOUT",
            CourierError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
