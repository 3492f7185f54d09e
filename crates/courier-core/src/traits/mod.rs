// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between the core and its external collaborators.
//!
//! Platform automation and persistence are consumed through these traits
//! so tests can substitute mocks and the bootstrap code can wire concrete
//! implementations without the core knowing about them.

pub mod provider;
pub mod store;

pub use provider::{OnEvent, ProviderConnection, ProviderEvent, ProviderRegistry, QrSnapshot};
pub use store::AccountStore;
