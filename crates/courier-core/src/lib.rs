// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Courier messaging relay.
//!
//! This crate provides the foundational types, error taxonomy, and trait
//! seams used throughout the Courier workspace: the unified message
//! envelope broadcast to dashboard clients, the session status state
//! machine, and the provider/persistence collaborator contracts.

pub mod error;
pub mod qr;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CourierError;
pub use types::{
    AccountRecord, HubStatus, MediaDownloaded, MessageEnvelope, MessageKind, Platform, SessionId,
    SessionStatus,
};

pub use qr::QrStore;
pub use traits::{
    AccountStore, OnEvent, ProviderConnection, ProviderEvent, ProviderRegistry, QrSnapshot,
};
