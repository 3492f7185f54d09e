// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide typed event bus for account lifecycle signals.
//!
//! Replaces the ad-hoc "emit on the process object" pattern with an
//! explicit bus: transport-layer inbound client events and internal
//! lifecycle code both publish [`AccountEvent`]s, and the broadcast hub
//! and provider managers subscribe. Listener wiring is idempotent per
//! listener name, so repeated initialization attempts are detected and
//! skipped instead of stacking duplicate handlers.

use std::collections::HashSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use courier_core::types::{Platform, SessionId, SessionStatus};

/// Account lifecycle signals relayed across the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum AccountEvent {
    /// A new account finished connecting and should start listening.
    #[serde(rename_all = "camelCase")]
    Added {
        platform: Platform,
        session_id: SessionId,
        #[serde(skip_serializing_if = "Option::is_none")]
        account_name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        workspace_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        brand_id: Option<i64>,
    },
    /// An account's connection status changed.
    #[serde(rename_all = "camelCase")]
    StatusChanged {
        account_id: String,
        status: SessionStatus,
    },
    /// Account metadata changed; subscribers should refresh their view.
    DataChanged,
}

/// Broadcast bus carrying [`AccountEvent`]s to all registered listeners.
///
/// Constructed once at bootstrap and shared by handle. Slow subscribers
/// that lag behind the channel capacity lose the oldest events, which is
/// acceptable for these advisory signals.
pub struct AccountBus {
    tx: broadcast::Sender<AccountEvent>,
    wired: Mutex<HashSet<String>>,
}

impl AccountBus {
    /// Create a bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            wired: Mutex::new(HashSet::new()),
        }
    }

    /// Publish an event to every current subscriber.
    ///
    /// Returns the number of subscribers that received it. Publishing with
    /// no subscribers is not an error; the event is simply dropped.
    pub fn publish(&self, event: AccountEvent) -> usize {
        match self.tx.send(event) {
            Ok(count) => count,
            Err(_) => {
                debug!("account event published with no subscribers");
                0
            }
        }
    }

    /// Subscribe anonymously (used by short-lived tasks and tests).
    pub fn subscribe(&self) -> broadcast::Receiver<AccountEvent> {
        self.tx.subscribe()
    }

    /// Register a named long-lived listener.
    ///
    /// Returns `None` when a listener with this name was already wired:
    /// multiple subsystems may attempt to initialize the same wiring, and
    /// only the first attempt may win.
    pub fn register_listener(&self, name: &str) -> Option<broadcast::Receiver<AccountEvent>> {
        let mut wired = self.wired.lock().expect("bus listener set poisoned");
        if !wired.insert(name.to_string()) {
            warn!(listener = %name, "account bus listener already wired, skipping");
            return None;
        }
        debug!(listener = %name, "account bus listener wired");
        Some(self.tx.subscribe())
    }

    /// Whether a named listener has been wired.
    pub fn is_registered(&self, name: &str) -> bool {
        self.wired
            .lock()
            .expect("bus listener set poisoned")
            .contains(name)
    }

    /// Current number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn published_events_reach_all_subscribers() {
        let bus = AccountBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let delivered = bus.publish(AccountEvent::DataChanged);
        assert_eq!(delivered, 2);

        assert!(matches!(rx1.recv().await.unwrap(), AccountEvent::DataChanged));
        assert!(matches!(rx2.recv().await.unwrap(), AccountEvent::DataChanged));
    }

    #[tokio::test]
    async fn named_listener_registration_is_idempotent() {
        let bus = AccountBus::new(16);

        let first = bus.register_listener("hub-account-listener");
        assert!(first.is_some());
        assert!(bus.is_registered("hub-account-listener"));

        let second = bus.register_listener("hub-account-listener");
        assert!(second.is_none(), "duplicate wiring must be refused");

        // Only the surviving receiver counts as a subscriber.
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_not_an_error() {
        let bus = AccountBus::new(4);
        assert_eq!(bus.publish(AccountEvent::DataChanged), 0);
    }

    #[tokio::test]
    async fn added_event_carries_session_identity() {
        let bus = AccountBus::new(4);
        let mut rx = bus.subscribe();

        bus.publish(AccountEvent::Added {
            platform: Platform::Telegram,
            session_id: SessionId("tg-1".into()),
            account_name: Some("Support".into()),
            workspace_id: Some(7),
            brand_id: None,
        });

        match rx.recv().await.unwrap() {
            AccountEvent::Added {
                platform,
                session_id,
                account_name,
                workspace_id,
                brand_id,
            } => {
                assert_eq!(platform, Platform::Telegram);
                assert_eq!(session_id.as_str(), "tg-1");
                assert_eq!(account_name.as_deref(), Some("Support"));
                assert_eq!(workspace_id, Some(7));
                assert_eq!(brand_id, None);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn events_serialize_with_wire_names() {
        let event = AccountEvent::StatusChanged {
            account_id: "acc-1".into(),
            status: SessionStatus::Ready,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "statusChanged");
        assert_eq!(json["accountId"], "acc-1");
        assert_eq!(json["status"], "READY");
    }
}
