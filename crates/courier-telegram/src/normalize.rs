// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw Telegram update normalization into the unified envelope.

use chrono::Utc;

use courier_core::types::{ChatInfo, DeliveryStatus, MessageBody};
use courier_core::{MessageEnvelope, MessageKind, Platform};

use crate::client::TgRawUpdate;

/// Build the broadcast envelope for one raw update.
pub fn to_envelope(account_id: &str, raw: TgRawUpdate) -> MessageEnvelope {
    let now = Utc::now().timestamp_millis();
    let kind = raw
        .media_kind
        .as_deref()
        .map(MessageKind::from_raw)
        .unwrap_or(MessageKind::Text);
    let chat_name = raw.chat_title.unwrap_or_else(|| raw.chat_id.clone());

    MessageEnvelope {
        message: MessageBody {
            id: raw.id,
            chat_id: raw.chat_id.clone(),
            sender: raw.sender.clone(),
            content: raw.content.clone(),
            timestamp: raw.timestamp,
            is_own: raw.outgoing,
            kind,
            status: DeliveryStatus::Delivered,
            geo: raw.geo,
        },
        chat_info: ChatInfo {
            id: raw.chat_id,
            platform: Platform::Telegram,
            account_id: account_id.to_string(),
            name: chat_name,
            kind: "individual".to_string(),
            avatar: None,
            last_message: raw.content,
            last_message_sender: raw.sender,
            last_message_time: raw.timestamp,
            unread_count: if raw.outgoing { 0 } else { 1 },
            created_at: now,
            updated_at: now,
        },
        account_id: account_id.to_string(),
    }
}
