// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canned wire payloads for tests.

use courier_core::types::{ChatInfo, DeliveryStatus, MessageBody, MessageKind};
use courier_core::{MessageEnvelope, Platform};

/// A plain text envelope for `account_id` in chat `chat_id`.
pub fn sample_envelope(account_id: &str, chat_id: &str) -> MessageEnvelope {
    let now = chrono::Utc::now().timestamp_millis();
    MessageEnvelope {
        message: MessageBody {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.to_string(),
            sender: "contact-1".to_string(),
            content: "hello from the test rig".to_string(),
            timestamp: now,
            is_own: false,
            kind: MessageKind::Text,
            status: DeliveryStatus::Delivered,
            geo: None,
        },
        chat_info: ChatInfo {
            id: chat_id.to_string(),
            platform: Platform::Whatsapp,
            account_id: account_id.to_string(),
            name: "Test Contact".to_string(),
            kind: "individual".to_string(),
            avatar: None,
            last_message: "hello from the test rig".to_string(),
            last_message_sender: "contact-1".to_string(),
            last_message_time: now,
            unread_count: 1,
            created_at: now,
            updated_at: now,
        },
        account_id: account_id.to_string(),
    }
}
