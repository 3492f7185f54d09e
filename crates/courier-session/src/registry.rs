// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session registry: the single writer of session status.
//!
//! Every status transition goes through [`SessionRegistry::set_status`],
//! which enforces the monotonic login progression. Providers and transport
//! handlers propose transitions; the registry decides.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use courier_core::{AccountRecord, AccountStore, CourierError, Platform, SessionId, SessionStatus};

/// One live session tracked by the registry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub platform: Platform,
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    fn to_account_record(&self) -> AccountRecord {
        AccountRecord {
            account_id: self.account_id.clone(),
            platform: self.platform,
            workspace_id: self.workspace_id,
            brand_id: self.brand_id,
            label: self.label.clone(),
            created_at: self
                .created_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// In-memory session table with write-through account persistence.
///
/// Status lives only here; the backing [`AccountStore`] records account
/// existence so sessions survive a process restart.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionRecord>>,
    store: Arc<dyn AccountStore>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            store,
        }
    }

    /// Create a fresh session in status `Init` and persist its account row.
    pub async fn create(&self, platform: Platform) -> Result<SessionId, CourierError> {
        let session_id = SessionId(uuid::Uuid::new_v4().to_string());
        let record = SessionRecord {
            session_id: session_id.clone(),
            platform,
            account_id: session_id.0.clone(),
            workspace_id: None,
            brand_id: None,
            label: None,
            status: SessionStatus::Init,
            created_at: Utc::now(),
        };
        self.store.insert_account(&record.to_account_record()).await?;
        self.sessions
            .lock()
            .await
            .insert(session_id.0.clone(), record);
        info!(session_id = %session_id, %platform, "session created");
        Ok(session_id)
    }

    /// Adopt a persisted account into the in-memory table without writing
    /// back to the store. Used during startup reconnect.
    pub async fn restore(&self, account: &AccountRecord, status: SessionStatus) {
        let created_at = DateTime::parse_from_rfc3339(&account.created_at)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let record = SessionRecord {
            session_id: SessionId(account.account_id.clone()),
            platform: account.platform,
            account_id: account.account_id.clone(),
            workspace_id: account.workspace_id,
            brand_id: account.brand_id,
            label: account.label.clone(),
            status,
            created_at,
        };
        debug!(session_id = %record.session_id, ?status, "session restored");
        self.sessions
            .lock()
            .await
            .insert(account.account_id.clone(), record);
    }

    pub async fn get(&self, session_id: &SessionId) -> Option<SessionRecord> {
        self.sessions.lock().await.get(session_id.as_str()).cloned()
    }

    /// Propose a status transition.
    ///
    /// Returns `Ok(true)` when applied, `Ok(false)` when rejected as a
    /// regression against the login progression (logged, state unchanged),
    /// and an error for unknown sessions.
    pub async fn set_status(
        &self,
        session_id: &SessionId,
        status: SessionStatus,
    ) -> Result<bool, CourierError> {
        let mut sessions = self.sessions.lock().await;
        let record = sessions.get_mut(session_id.as_str()).ok_or_else(|| {
            CourierError::Session(format!("unknown session: {session_id}"))
        })?;
        if !record.status.accepts(status) {
            warn!(
                session_id = %session_id,
                from = ?record.status,
                to = ?status,
                "rejected non-monotonic status transition"
            );
            return Ok(false);
        }
        debug!(session_id = %session_id, from = ?record.status, to = ?status, "status transition");
        record.status = status;
        Ok(true)
    }

    pub async fn list_by_platform(&self, platform: Platform) -> Vec<SessionRecord> {
        self.sessions
            .lock()
            .await
            .values()
            .filter(|r| r.platform == platform)
            .cloned()
            .collect()
    }

    pub async fn list_all(&self) -> Vec<SessionRecord> {
        self.sessions.lock().await.values().cloned().collect()
    }

    /// Remove a session from the live table and its persisted row.
    ///
    /// Deleting an unknown session is not an error.
    pub async fn delete(&self, session_id: &SessionId) -> Result<(), CourierError> {
        let removed = self.sessions.lock().await.remove(session_id.as_str());
        self.store
            .delete_account_by_session_id(session_id.as_str())
            .await?;
        if removed.is_some() {
            info!(session_id = %session_id, "session deleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemStore;

    fn make_registry() -> (SessionRegistry, Arc<MemStore>) {
        let store = Arc::new(MemStore::default());
        (SessionRegistry::new(store.clone()), store)
    }

    #[tokio::test]
    async fn create_starts_in_init_and_persists() {
        let (registry, store) = make_registry();
        let id = registry.create(Platform::Whatsapp).await.unwrap();

        let record = registry.get(&id).await.unwrap();
        assert_eq!(record.status, SessionStatus::Init);
        assert_eq!(record.platform, Platform::Whatsapp);
        assert_eq!(store.records().await.len(), 1);
    }

    #[tokio::test]
    async fn forward_transitions_apply() {
        let (registry, _store) = make_registry();
        let id = registry.create(Platform::Whatsapp).await.unwrap();

        for status in [
            SessionStatus::Loading,
            SessionStatus::QrReady,
            SessionStatus::QrScanned,
            SessionStatus::Connecting,
            SessionStatus::Ready,
        ] {
            assert!(registry.set_status(&id, status).await.unwrap());
        }
        assert_eq!(registry.get(&id).await.unwrap().status, SessionStatus::Ready);
    }

    #[tokio::test]
    async fn backward_transition_is_rejected_and_state_unchanged() {
        let (registry, _store) = make_registry();
        let id = registry.create(Platform::Telegram).await.unwrap();
        registry
            .set_status(&id, SessionStatus::QrScanned)
            .await
            .unwrap();

        let applied = registry
            .set_status(&id, SessionStatus::QrReady)
            .await
            .unwrap();
        assert!(!applied);
        assert_eq!(
            registry.get(&id).await.unwrap().status,
            SessionStatus::QrScanned
        );
    }

    #[tokio::test]
    async fn disconnected_reachable_from_any_live_state() {
        let (registry, _store) = make_registry();
        let id = registry.create(Platform::Whatsapp).await.unwrap();

        assert!(registry
            .set_status(&id, SessionStatus::Disconnected)
            .await
            .unwrap());
        // Out of Disconnected only via a reconnect path.
        assert!(!registry
            .set_status(&id, SessionStatus::Ready)
            .await
            .unwrap());
        assert!(registry
            .set_status(&id, SessionStatus::Connecting)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn set_status_unknown_session_errors() {
        let (registry, _store) = make_registry();
        let err = registry
            .set_status(&SessionId("ghost".into()), SessionStatus::Ready)
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::Session(_)));
    }

    #[tokio::test]
    async fn delete_removes_live_and_persisted_record() {
        let (registry, store) = make_registry();
        let id = registry.create(Platform::Telegram).await.unwrap();

        registry.delete(&id).await.unwrap();
        assert!(registry.get(&id).await.is_none());
        assert!(store.records().await.is_empty());

        // Deleting again is not an error.
        registry.delete(&id).await.unwrap();
    }

    #[tokio::test]
    async fn restore_adopts_without_writing_store() {
        let (registry, store) = make_registry();
        let account = AccountRecord {
            account_id: "wa-restored".into(),
            platform: Platform::Whatsapp,
            workspace_id: None,
            brand_id: None,
            label: Some("Main".into()),
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };

        registry.restore(&account, SessionStatus::Connecting).await;

        let record = registry.get(&SessionId("wa-restored".into())).await.unwrap();
        assert_eq!(record.status, SessionStatus::Connecting);
        assert_eq!(record.label.as_deref(), Some("Main"));
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn list_by_platform_filters() {
        let (registry, _store) = make_registry();
        registry.create(Platform::Whatsapp).await.unwrap();
        registry.create(Platform::Whatsapp).await.unwrap();
        registry.create(Platform::Telegram).await.unwrap();

        assert_eq!(registry.list_by_platform(Platform::Whatsapp).await.len(), 2);
        assert_eq!(registry.list_by_platform(Platform::Telegram).await.len(), 1);
        assert_eq!(registry.list_all().await.len(), 3);
    }
}
