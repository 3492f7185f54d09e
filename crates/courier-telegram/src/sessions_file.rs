// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram session list bookkeeping.
//!
//! The automation layer keeps its known sessions in a JSON array at
//! `<data_dir>/data/sessions.json`. An entry matches a session when its
//! `id` equals the session id, or its nested `data.session` does.

use std::path::{Path, PathBuf};

use tracing::warn;

/// Path of the session list file.
pub fn sessions_file(data_dir: &str) -> PathBuf {
    Path::new(data_dir).join("data").join("sessions.json")
}

/// Whether the session list contains an entry for `session_id`.
///
/// A missing or unparseable file reads as empty.
pub fn session_listed(data_dir: &str, session_id: &str) -> bool {
    let path = sessions_file(data_dir);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(_) => return false,
    };
    let entries: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable session list");
            return false;
        }
    };
    entries.iter().any(|entry| {
        entry.get("id").and_then(|v| v.as_str()) == Some(session_id)
            || entry
                .get("data")
                .and_then(|d| d.get("session"))
                .and_then(|v| v.as_str())
                == Some(session_id)
    })
}
