// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Room-based fan-out of server events to connected dashboard clients.
//!
//! Delivery is fire-and-forget: a full or dead client queue drops that
//! client's copy and never blocks or errors delivery to the others.

use std::collections::HashSet;

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use courier_core::HubStatus;

/// Room name for a chat's message feed.
pub fn chat_room(chat_id: &str) -> String {
    format!("chat:{chat_id}")
}

/// Wire frame pushed to clients.
#[derive(Debug, Serialize)]
struct Frame<'a> {
    event: &'a str,
    data: &'a Value,
}

/// The broadcast hub. One instance per process, constructed at bootstrap.
#[derive(Default)]
pub struct BroadcastHub {
    clients: DashMap<String, mpsc::Sender<String>>,
    rooms: DashMap<String, HashSet<String>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a client's outbound queue under its connection id.
    pub fn register_client(&self, client_id: &str, tx: mpsc::Sender<String>) {
        self.clients.insert(client_id.to_string(), tx);
        debug!(client_id, "hub client registered");
    }

    /// Detach a client and drop all its room memberships.
    pub fn unregister_client(&self, client_id: &str) {
        self.clients.remove(client_id);
        for mut members in self.rooms.iter_mut() {
            members.remove(client_id);
        }
        self.rooms.retain(|_, members| !members.is_empty());
        debug!(client_id, "hub client unregistered");
    }

    /// Subscribe a client to a room. Idempotent.
    pub fn join(&self, client_id: &str, room: &str) {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(client_id.to_string());
        debug!(client_id, room, "hub client joined room");
    }

    /// Push `event` to every connected client. Returns delivery count.
    pub fn publish_global(&self, event: &str, data: &Value) -> usize {
        let frame = self.encode(event, data);
        let mut delivered = 0;
        for entry in self.clients.iter() {
            if entry.value().try_send(frame.clone()).is_ok() {
                delivered += 1;
            } else {
                trace!(client_id = %entry.key(), event, "dropping frame for slow client");
            }
        }
        delivered
    }

    /// Push `event` to the members of `room`. Returns delivery count.
    pub fn publish_to_room(&self, room: &str, event: &str, data: &Value) -> usize {
        let Some(members) = self.rooms.get(room) else {
            return 0;
        };
        let frame = self.encode(event, data);
        let mut delivered = 0;
        for client_id in members.iter() {
            let Some(tx) = self.clients.get(client_id) else {
                continue;
            };
            if tx.try_send(frame.clone()).is_ok() {
                delivered += 1;
            } else {
                trace!(client_id = %client_id, room, event, "dropping frame for slow client");
            }
        }
        delivered
    }

    /// Push `event` to one client, bypassing rooms.
    pub fn publish_to_client(&self, client_id: &str, event: &str, data: &Value) -> bool {
        let Some(tx) = self.clients.get(client_id) else {
            return false;
        };
        tx.try_send(self.encode(event, data)).is_ok()
    }

    /// Live snapshot of the transport state.
    pub fn status(&self) -> HubStatus {
        HubStatus {
            is_active: !self.clients.is_empty(),
            connected_clients: self.clients.len(),
        }
    }

    fn encode(&self, event: &str, data: &Value) -> String {
        serde_json::to_string(&Frame { event, data })
            .unwrap_or_else(|_| format!(r#"{{"event":"{event}","data":null}}"#))
    }
}
