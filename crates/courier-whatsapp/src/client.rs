// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp automation client seam.
//!
//! The provider never talks to the platform directly; it consumes an event
//! stream per session through this trait so tests can substitute a scripted
//! client.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

use courier_core::{CourierError, SessionId};
use courier_core::types::GeoPoint;

/// Raw inbound message as produced by the WhatsApp automation layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaRawMessage {
    pub id: String,
    pub chat_id: String,
    pub sender: String,
    pub content: String,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    pub from_me: bool,
    /// Platform type string ("chat", "image", "ptt", "encrypted", ...).
    pub message_type: String,
    pub chat_name: Option<String>,
    pub geo: Option<GeoPoint>,
}

/// Event stream element for one WhatsApp session.
///
/// Matches the bridge wire format: `{"type": "qr", "dataUrl": "..."}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WaClientEvent {
    /// A login QR code became available, already rendered as a data URL.
    Qr { data_url: String },
    /// The user scanned the current QR code.
    QrScanned,
    /// The platform session finished authenticating.
    Connected { display_name: Option<String> },
    /// An inbound message arrived.
    Message(WaRawMessage),
    /// A media attachment finished downloading to local disk.
    MediaDownloaded {
        file_path: String,
        message_id: String,
        media_type: String,
    },
    /// The platform side logged the account out.
    LoggedOut { display_name: Option<String> },
    /// The underlying automation client dropped the connection.
    Disconnected { reason: String },
}

/// Handle to the WhatsApp automation layer.
#[async_trait]
pub trait WaClient: Send + Sync + 'static {
    /// Open (or attach to) the platform session and stream its events.
    ///
    /// The returned receiver closes when the platform client goes away.
    async fn connect(
        &self,
        session_id: &SessionId,
    ) -> Result<mpsc::Receiver<WaClientEvent>, CourierError>;

    /// Tear down the automation handle for the session. Idempotent.
    async fn disconnect(&self, session_id: &SessionId) -> Result<(), CourierError>;
}
