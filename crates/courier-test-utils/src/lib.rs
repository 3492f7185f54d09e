// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Courier integration tests.
//!
//! Provides mock collaborators for fast, deterministic, CI-runnable tests
//! without a real platform automation layer.
//!
//! # Components
//!
//! - [`MockProvider`] - Scriptable provider connection manager
//! - [`MemoryAccountStore`] - In-memory `AccountStore`
//! - [`sample_envelope`] - Canned broadcast envelope

pub mod envelope;
pub mod memory_store;
pub mod mock_provider;

pub use envelope::sample_envelope;
pub use memory_store::MemoryAccountStore;
pub use mock_provider::MockProvider;
