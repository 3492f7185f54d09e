// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw WhatsApp payload normalization into the unified envelope.

use chrono::Utc;

use courier_core::types::{ChatInfo, DeliveryStatus, MessageBody};
use courier_core::{MessageEnvelope, MessageKind, Platform};

use crate::client::WaRawMessage;

/// Build the broadcast envelope for one raw message.
pub fn to_envelope(account_id: &str, raw: WaRawMessage) -> MessageEnvelope {
    let now = Utc::now().timestamp_millis();
    let kind = MessageKind::from_raw(&raw.message_type);
    let chat_name = raw.chat_name.unwrap_or_else(|| raw.chat_id.clone());

    MessageEnvelope {
        message: MessageBody {
            id: raw.id,
            chat_id: raw.chat_id.clone(),
            sender: raw.sender.clone(),
            content: raw.content.clone(),
            timestamp: raw.timestamp,
            is_own: raw.from_me,
            kind,
            status: DeliveryStatus::Delivered,
            geo: raw.geo,
        },
        chat_info: ChatInfo {
            id: raw.chat_id,
            platform: Platform::Whatsapp,
            account_id: account_id.to_string(),
            name: chat_name,
            kind: "individual".to_string(),
            avatar: None,
            last_message: raw.content,
            last_message_sender: raw.sender,
            last_message_time: raw.timestamp,
            unread_count: if raw.from_me { 0 } else { 1 },
            created_at: now,
            updated_at: now,
        },
        account_id: account_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(message_type: &str) -> WaRawMessage {
        WaRawMessage {
            id: "m1".into(),
            chat_id: "123@c.us".into(),
            sender: "123@c.us".into(),
            content: "hello".into(),
            timestamp: 1_700_000_000_000,
            from_me: false,
            message_type: message_type.into(),
            chat_name: Some("Ada".into()),
            geo: None,
        }
    }

    #[test]
    fn chat_message_normalizes_to_text() {
        let envelope = to_envelope("wa-1", raw("chat"));
        assert_eq!(envelope.message.kind, MessageKind::Text);
        assert_eq!(envelope.account_id, "wa-1");
        assert_eq!(envelope.chat_info.platform, Platform::Whatsapp);
        assert_eq!(envelope.chat_info.name, "Ada");
        assert_eq!(envelope.chat_info.last_message, "hello");
    }

    #[test]
    fn encrypted_falls_back_to_text() {
        let envelope = to_envelope("wa-1", raw("encrypted"));
        assert_eq!(envelope.message.kind, MessageKind::Text);
    }

    #[test]
    fn ptt_maps_to_voice() {
        let envelope = to_envelope("wa-1", raw("ptt"));
        assert_eq!(envelope.message.kind, MessageKind::Voice);
    }

    #[test]
    fn chat_id_stands_in_for_missing_name() {
        let mut r = raw("chat");
        r.chat_name = None;
        let envelope = to_envelope("wa-1", r);
        assert_eq!(envelope.chat_info.name, "123@c.us");
    }

    #[test]
    fn own_messages_do_not_bump_unread() {
        let mut r = raw("chat");
        r.from_me = true;
        let envelope = to_envelope("wa-1", r);
        assert!(envelope.message.is_own);
        assert_eq!(envelope.chat_info.unread_count, 0);
    }
}
