// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Courier relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// Relay identity and logging settings.
    #[serde(default)]
    pub relay: RelayConfig,

    /// HTTP/WebSocket server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Session artifact and lifecycle settings.
    #[serde(default)]
    pub sessions: SessionsConfig,

    /// Platform automation bridge endpoints.
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Relay identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Display name of the relay instance.
    #[serde(default = "default_relay_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            name: default_relay_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_relay_name() -> String {
    "courier".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP/WebSocket server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Dashboard origins allowed by CORS. Empty = allow any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("courier").join("courier.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "courier.db".to_string())
}

/// Session artifact and lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionsConfig {
    /// Root directory for platform session artifacts.
    ///
    /// WhatsApp credentials live under `<data_dir>/sessions/`, the
    /// Telegram session list at `<data_dir>/data/sessions.json`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Records younger than this many seconds are skipped by the startup
    /// reconciler, so cleanup cannot race a session being created.
    #[serde(default = "default_reconcile_grace_secs")]
    pub reconcile_grace_secs: u64,

    /// Seconds a login QR code stays valid before queries report pending.
    #[serde(default = "default_qr_ttl_secs")]
    pub qr_ttl_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            reconcile_grace_secs: default_reconcile_grace_secs(),
            qr_ttl_secs: default_qr_ttl_secs(),
        }
    }
}

fn default_data_dir() -> String {
    dirs::data_dir()
        .map(|p| p.join("courier"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| ".".to_string())
}

fn default_reconcile_grace_secs() -> u64 {
    300
}

fn default_qr_ttl_secs() -> u64 {
    60
}

/// Endpoints of the platform automation sidecars.
///
/// Each provider crate ships a bridge client that drives its sidecar's
/// HTTP surface; these are the base URLs those clients talk to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProvidersConfig {
    /// Base URL of the WhatsApp automation sidecar.
    #[serde(default = "default_whatsapp_bridge_url")]
    pub whatsapp_bridge_url: String,

    /// Base URL of the Telegram automation sidecar.
    #[serde(default = "default_telegram_bridge_url")]
    pub telegram_bridge_url: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            whatsapp_bridge_url: default_whatsapp_bridge_url(),
            telegram_bridge_url: default_telegram_bridge_url(),
        }
    }
}

fn default_whatsapp_bridge_url() -> String {
    "http://127.0.0.1:3001".to_string()
}

fn default_telegram_bridge_url() -> String {
    "http://127.0.0.1:3002".to_string()
}
