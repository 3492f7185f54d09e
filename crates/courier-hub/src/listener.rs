// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bridges the account bus into the broadcast hub.
//!
//! One named listener per process. A second wiring attempt finds the name
//! already taken and becomes a no-op instead of a duplicate handler.

use std::sync::Arc;

use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use courier_bus::{AccountBus, AccountEvent};
use courier_core::{CourierError, OnEvent, ProviderEvent, ProviderRegistry};

use crate::hub::{chat_room, BroadcastHub};

const LISTENER_NAME: &str = "hub-account-listener";

/// Builds the provider callback that relays platform events to dashboard
/// clients: `newMessage` into the chat room, `chatUpdated`,
/// `mediaDownloaded` and `sessionLoggedOut` globally.
pub fn hub_fanout(hub: Arc<BroadcastHub>) -> OnEvent {
    Arc::new(move |event| match event {
        ProviderEvent::Message(envelope) => {
            let room = chat_room(&envelope.message.chat_id);
            match serde_json::to_value(&envelope) {
                Ok(data) => {
                    hub.publish_to_room(&room, "newMessage", &data);
                    // Chat list entries are rendered straight from this
                    // payload, so the full chat info goes out, not just ids.
                    hub.publish_global("chatUpdated", &data["chatInfo"]);
                }
                Err(e) => error!(error = %e, "failed to encode message envelope"),
            }
        }
        ProviderEvent::MediaDownloaded(media) => match serde_json::to_value(&media) {
            Ok(data) => {
                hub.publish_global("mediaDownloaded", &data);
            }
            Err(e) => error!(error = %e, "failed to encode media notification"),
        },
        ProviderEvent::LoggedOut {
            account_id,
            display_name,
        } => {
            hub.publish_global(
                "sessionLoggedOut",
                &json!({"accountId": account_id, "displayName": display_name}),
            );
        }
    })
}

/// Wire the account bus to the hub and the provider registry.
///
/// Returns the spawned task handle, or `None` when the listener was
/// already wired (safe to ignore).
pub fn spawn_account_listener(
    bus: Arc<AccountBus>,
    hub: Arc<BroadcastHub>,
    providers: Arc<ProviderRegistry>,
) -> Option<JoinHandle<()>> {
    let mut rx = bus.register_listener(LISTENER_NAME)?;
    let handle = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "account listener lagged, events dropped");
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    debug!("account bus closed, listener exiting");
                    break;
                }
            };
            handle_event(&hub, &providers, event).await;
        }
    });
    info!(listener = LISTENER_NAME, "account listener wired");
    Some(handle)
}

async fn handle_event(hub: &BroadcastHub, providers: &ProviderRegistry, event: AccountEvent) {
    match event {
        AccountEvent::Added {
            platform,
            session_id,
            account_name,
            ..
        } => {
            info!(%platform, %session_id, "account added, starting listeners");
            hub.publish_global(
                "accountStatusChanged",
                &json!({
                    "accountId": session_id,
                    "platform": platform,
                    "accountName": account_name,
                    "status": "CONNECTING",
                }),
            );
            match providers.get(platform) {
                Ok(provider) => {
                    if let Err(e) = provider.start_account_listening(&session_id).await {
                        warn!(%session_id, error = %e, "listener start failed");
                    }
                }
                Err(e @ CourierError::ProviderUnavailable { .. }) => {
                    warn!(%platform, error = %e, "account added for unavailable platform");
                }
                Err(e) => warn!(%platform, error = %e, "provider lookup failed"),
            }
        }
        AccountEvent::StatusChanged { account_id, status } => {
            hub.publish_global(
                "accountStatusChanged",
                &json!({"accountId": account_id, "status": status}),
            );
        }
        AccountEvent::DataChanged => {
            hub.publish_global("accountDataChanged", &json!({}));
        }
    }
}
