// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Courier workspace.
//!
//! Wire-facing structs serialize with the camelCase field names the
//! dashboard expects (`chatId`, `messageType`, `accountId`, ...).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for one messaging-account session.
///
/// Opaque, unique, and stable for the account's lifetime. At any instant a
/// `SessionId` identifies at most one live provider connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Messaging platform a session belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Whatsapp,
    Telegram,
}

/// Login/connection lifecycle status of a session.
///
/// The first six states form the login progression and are totally
/// ordered; `Disconnected` is reachable from any non-terminal state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Init,
    Loading,
    QrReady,
    QrScanned,
    Connecting,
    Ready,
    Disconnected,
}

impl SessionStatus {
    /// Position in the login progression, or `None` for `Disconnected`.
    fn login_rank(self) -> Option<u8> {
        match self {
            SessionStatus::Init => Some(0),
            SessionStatus::Loading => Some(1),
            SessionStatus::QrReady => Some(2),
            SessionStatus::QrScanned => Some(3),
            SessionStatus::Connecting => Some(4),
            SessionStatus::Ready => Some(5),
            SessionStatus::Disconnected => None,
        }
    }

    /// Whether a transition from `self` to `next` is allowed.
    ///
    /// Moves to an earlier login state are rejected so out-of-order
    /// platform events cannot flap the visible status. Leaving
    /// `Disconnected` is only possible through a reconnect
    /// (`Loading`/`Connecting`), driven by operator action.
    pub fn accepts(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        match (self, next) {
            (a, b) if a == b => false,
            (Disconnected, Loading | Connecting) => true,
            (Disconnected, _) => false,
            (_, Disconnected) => true,
            (a, b) => match (a.login_rank(), b.login_rank()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }
}

/// Closed set of message content kinds broadcast to the dashboard.
///
/// Unrecognized upstream types normalize to `Text` via [`MessageKind::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Photo,
    Video,
    Voice,
    Document,
    Sticker,
    Location,
    System,
}

impl MessageKind {
    /// Normalize a raw platform-specific type string into the closed set.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "photo" | "image" => MessageKind::Photo,
            "video" => MessageKind::Video,
            "voice" | "audio" | "ptt" => MessageKind::Voice,
            "document" | "file" => MessageKind::Document,
            "sticker" => MessageKind::Sticker,
            "location" => MessageKind::Location,
            "system" => MessageKind::System,
            // "encrypted", "chat" and anything unknown fall back to text.
            _ => MessageKind::Text,
        }
    }
}

/// Delivery status of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Read,
}

/// Geographic coordinates attached to a location message.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub long: f64,
}

/// The message half of the unified envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    pub id: String,
    pub chat_id: String,
    pub sender: String,
    pub content: String,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    pub is_own: bool,
    #[serde(rename = "messageType")]
    pub kind: MessageKind,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoPoint>,
}

/// Chat metadata carried alongside every broadcast message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInfo {
    pub id: String,
    pub platform: Platform,
    pub account_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub last_message: String,
    #[serde(default)]
    pub last_message_sender: String,
    /// Unix timestamp in milliseconds.
    #[serde(default)]
    pub last_message_time: i64,
    #[serde(default)]
    pub unread_count: u32,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// The platform-agnostic envelope broadcast to dashboard clients.
///
/// Produced by a provider connection manager from a raw platform payload;
/// consumed exactly once by the broadcast hub. Not persisted here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope {
    pub message: MessageBody,
    pub chat_info: ChatInfo,
    pub account_id: String,
}

/// Notification that a media attachment finished downloading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDownloaded {
    pub file_path: String,
    pub message_id: String,
    pub media_type: String,
    pub account_id: String,
}

/// Persisted account row shape, as exposed by the [`AccountStore`] collaborator.
///
/// [`AccountStore`]: crate::traits::store::AccountStore
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub account_id: String,
    pub platform: Platform,
    pub workspace_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub label: Option<String>,
    /// ISO 8601 creation timestamp.
    pub created_at: String,
}

/// Ephemeral snapshot of the broadcast hub's transport state.
///
/// Recomputed on demand from the live client table; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStatus {
    pub is_active: bool,
    pub connected_clients: usize,
}
