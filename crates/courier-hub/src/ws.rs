// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket transport for dashboard clients.
//!
//! Client -> Server (JSON):
//! ```json
//! {"event": "join", "data": {"chatId": "123@c.us"}}
//! {"event": "accountAdded", "data": {"platform": "whatsapp", "sessionId": "..."}}
//! {"event": "getAccountStatus"}
//! {"event": "test"}
//! ```
//!
//! Server -> Client frames use the same `{event, data}` shape:
//! `newMessage`, `chatUpdated`, `accountStatusChanged`, `mediaDownloaded`,
//! `sessionLoggedOut`, `testResponse`, `accountStatusResponse`.

use std::str::FromStr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use courier_bus::AccountEvent;
use courier_core::{Platform, SessionId, SessionStatus};

use crate::hub::chat_room;
use crate::server::AppState;

/// Incoming WebSocket frame.
#[derive(Debug, Deserialize)]
struct WsIncoming {
    event: String,
    #[serde(default)]
    data: Value,
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Drive one client connection: register with the hub, forward its queue,
/// and dispatch inbound frames until the socket closes.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let client_id = uuid::Uuid::new_v4().to_string();

    let (tx, mut rx) = mpsc::channel::<String>(64);
    state.hub.register_client(&client_id, tx);

    let sender_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let incoming: WsIncoming = match serde_json::from_str(&text) {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(client_id, error = %e, "invalid WebSocket frame");
                        continue;
                    }
                };
                dispatch_frame(&state, &client_id, incoming);
            }
            Message::Close(_) => break,
            _ => {} // Binary and ping frames are ignored.
        }
    }

    state.hub.unregister_client(&client_id);
    sender_task.abort();
}

/// Handle one inbound frame. Unknown events are logged and dropped.
fn dispatch_frame(state: &AppState, client_id: &str, incoming: WsIncoming) {
    match incoming.event.as_str() {
        "join" => {
            let Some(chat_id) = incoming.data.get("chatId").and_then(|v| v.as_str()) else {
                warn!(client_id, "join frame without chatId");
                return;
            };
            state.hub.join(client_id, &chat_room(chat_id));
        }
        "test" => {
            state.hub.publish_to_client(
                client_id,
                "testResponse",
                &json!({
                    "ok": true,
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                }),
            );
        }
        "getAccountStatus" => {
            let status = serde_json::to_value(state.hub.status()).unwrap_or(Value::Null);
            state
                .hub
                .publish_to_client(client_id, "accountStatusResponse", &status);
        }
        "accountAdded" => {
            let Some(session_id) = incoming.data.get("sessionId").and_then(|v| v.as_str()) else {
                warn!(client_id, "accountAdded frame without sessionId");
                return;
            };
            let platform = incoming
                .data
                .get("platform")
                .and_then(|v| v.as_str())
                .and_then(|p| Platform::from_str(p).ok());
            let Some(platform) = platform else {
                warn!(client_id, "accountAdded frame with unknown platform");
                return;
            };
            state.bus.publish(AccountEvent::Added {
                platform,
                session_id: SessionId(session_id.to_string()),
                account_name: incoming
                    .data
                    .get("accountName")
                    .and_then(|v| v.as_str())
                    .map(String::from),
                workspace_id: incoming.data.get("workspaceId").and_then(|v| v.as_i64()),
                brand_id: incoming.data.get("brandId").and_then(|v| v.as_i64()),
            });
        }
        "accountStatusChanged" => {
            let account_id = incoming.data.get("accountId").and_then(|v| v.as_str());
            let status = incoming
                .data
                .get("status")
                .and_then(|v| v.as_str())
                .and_then(|s| SessionStatus::from_str(s).ok());
            let (Some(account_id), Some(status)) = (account_id, status) else {
                warn!(client_id, "malformed accountStatusChanged frame");
                return;
            };
            state.bus.publish(AccountEvent::StatusChanged {
                account_id: account_id.to_string(),
                status,
            });
        }
        "accountDataChanged" => {
            state.bus.publish(AccountEvent::DataChanged);
        }
        other => {
            debug!(client_id, event = other, "ignoring unknown frame");
        }
    }
}
