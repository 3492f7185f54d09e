// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard-side HTTP client for the Courier relay API.
//!
//! Wraps `reqwest` with cookie-based session auth and single-flight token
//! refresh: overlapping 401s coalesce into one `POST /auth/refresh`.

mod client;
mod error;

pub use client::{ApiClient, SessionExpiredHook};
pub use error::ClientError;
