// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiring store of QR login artifacts, one entry per session.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::traits::provider::QrSnapshot;
use crate::types::SessionId;

/// Per-session QR artifacts with a fixed time-to-live.
///
/// A new code from the platform replaces the previous one and restarts the
/// clock. Reads after expiry behave as if no code exists; expired entries
/// are dropped lazily on the next read.
pub struct QrStore {
    entries: DashMap<String, QrEntry>,
    ttl: Duration,
}

struct QrEntry {
    data_url: String,
    issued_at: Instant,
}

impl QrStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Record a fresh code for the session, replacing any previous one.
    pub fn put(&self, session_id: &SessionId, data_url: String) {
        self.entries.insert(
            session_id.0.clone(),
            QrEntry {
                data_url,
                issued_at: Instant::now(),
            },
        );
    }

    /// The live snapshot for the session, or `None` when absent or expired.
    pub fn get(&self, session_id: &SessionId) -> Option<QrSnapshot> {
        let entry = self.entries.get(session_id.as_str())?;
        let age = entry.issued_at.elapsed();
        if age >= self.ttl {
            drop(entry);
            self.entries.remove(session_id.as_str());
            return None;
        }
        Some(QrSnapshot {
            data_url: entry.data_url.clone(),
            expires_in: self.ttl - age,
        })
    }

    /// Drop the session's code, if any. Called once the login completes.
    pub fn clear(&self, session_id: &SessionId) {
        self.entries.remove(session_id.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId(s.to_string())
    }

    #[test]
    fn fresh_code_is_returned_with_remaining_ttl() {
        let store = QrStore::new(Duration::from_secs(60));
        store.put(&sid("s1"), "data:image/png;base64,abc".into());

        let snap = store.get(&sid("s1")).unwrap();
        assert_eq!(snap.data_url, "data:image/png;base64,abc");
        assert!(snap.expires_in <= Duration::from_secs(60));
        assert!(snap.expires_in > Duration::from_secs(55));
    }

    #[test]
    fn missing_session_has_no_snapshot() {
        let store = QrStore::new(Duration::from_secs(60));
        assert!(store.get(&sid("nobody")).is_none());
    }

    #[test]
    fn expired_code_reads_as_absent() {
        let store = QrStore::new(Duration::ZERO);
        store.put(&sid("s1"), "data:image/png;base64,abc".into());
        assert!(store.get(&sid("s1")).is_none());
        // The expired entry is gone, not just hidden.
        assert!(store.get(&sid("s1")).is_none());
    }

    #[test]
    fn replacement_restarts_the_clock() {
        let store = QrStore::new(Duration::from_secs(60));
        store.put(&sid("s1"), "data:old".into());
        store.put(&sid("s1"), "data:new".into());
        assert_eq!(store.get(&sid("s1")).unwrap().data_url, "data:new");
    }

    #[test]
    fn clear_removes_the_code() {
        let store = QrStore::new(Duration::from_secs(60));
        store.put(&sid("s1"), "data:x".into());
        store.clear(&sid("s1"));
        assert!(store.get(&sid("s1")).is_none());
    }
}
