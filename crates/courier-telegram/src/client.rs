// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram automation client seam.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;

use courier_core::types::GeoPoint;
use courier_core::{CourierError, SessionId};

/// Raw inbound update as produced by the Telegram automation layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TgRawUpdate {
    pub id: String,
    pub chat_id: String,
    pub sender: String,
    pub content: String,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    pub outgoing: bool,
    /// Media kind when the update carries an attachment ("photo",
    /// "voice", ...); `None` for plain text.
    pub media_kind: Option<String>,
    pub chat_title: Option<String>,
    pub geo: Option<GeoPoint>,
}

/// Event stream element for one Telegram session.
///
/// Matches the bridge wire format: `{"type": "qrToken", "payload": "..."}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum TgClientEvent {
    /// A QR login token became available. The provider renders it into a
    /// scannable image; the raw payload is the `tg://login?token=...` URL.
    QrToken { payload: String },
    /// The user confirmed the QR login on another device.
    QrScanned,
    /// The session finished authenticating.
    Connected { display_name: Option<String> },
    /// An inbound update arrived.
    Update(TgRawUpdate),
    /// A media attachment finished downloading to local disk.
    MediaDownloaded {
        file_path: String,
        message_id: String,
        media_type: String,
    },
    /// The account was signed out server-side.
    LoggedOut { display_name: Option<String> },
    /// The underlying automation client dropped the connection.
    Disconnected { reason: String },
}

/// Handle to the Telegram automation layer.
#[async_trait]
pub trait TgClient: Send + Sync + 'static {
    /// Open (or attach to) the platform session and stream its events.
    async fn connect(
        &self,
        session_id: &SessionId,
    ) -> Result<mpsc::Receiver<TgClientEvent>, CourierError>;

    /// Tear down the automation handle for the session. Idempotent.
    async fn disconnect(&self, session_id: &SessionId) -> Result<(), CourierError>;
}
