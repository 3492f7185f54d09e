// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session lifecycle for the Courier relay.
//!
//! Holds the [`SessionRegistry`], the single writer of session status, and
//! the startup [`reconciler`] that prunes account records whose platform
//! artifacts no longer exist.

pub mod reconciler;
pub mod registry;

#[cfg(test)]
mod testing;

pub use reconciler::{reconcile_sessions, ReconcileReport};
pub use registry::{SessionRecord, SessionRegistry};
