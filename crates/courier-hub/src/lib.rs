// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Broadcast hub and transport surface for the Courier relay.
//!
//! Hosts the WebSocket fan-out ([`BroadcastHub`]), the HTTP session and
//! login endpoints, and the bridge that relays account bus events to
//! connected dashboard clients.

pub mod hub;
pub mod listener;
pub mod routes;
pub mod server;
pub mod ws;

pub use hub::{chat_room, BroadcastHub};
pub use listener::{hub_fanout, spawn_account_listener};
pub use server::{build_router, start_server, AppState};
