// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-crate test doubles for the registry and reconciler tests.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::{
    AccountRecord, AccountStore, CourierError, OnEvent, Platform, ProviderConnection, QrSnapshot,
    SessionId,
};

/// In-memory account store.
#[derive(Default)]
pub struct MemStore {
    records: Mutex<Vec<AccountRecord>>,
}

impl MemStore {
    pub async fn records(&self) -> Vec<AccountRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl AccountStore for MemStore {
    async fn get_all_accounts(&self) -> Result<Vec<AccountRecord>, CourierError> {
        Ok(self.records.lock().await.clone())
    }

    async fn insert_account(&self, record: &AccountRecord) -> Result<(), CourierError> {
        let mut records = self.records.lock().await;
        records.retain(|r| r.account_id != record.account_id);
        records.push(record.clone());
        Ok(())
    }

    async fn delete_account_by_session_id(&self, session_id: &str) -> Result<(), CourierError> {
        self.records
            .lock()
            .await
            .retain(|r| r.account_id != session_id);
        Ok(())
    }
}

/// Provider stub with a fixed artifact set.
pub struct StubProvider {
    platform: Platform,
    artifacts: HashSet<String>,
}

impl StubProvider {
    pub fn with_artifacts(platform: Platform, session_ids: &[&str]) -> Self {
        Self {
            platform,
            artifacts: session_ids.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ProviderConnection for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn start(&self, _on_event: OnEvent) -> Result<(), CourierError> {
        Ok(())
    }

    async fn start_account_listening(&self, _session_id: &SessionId) -> Result<(), CourierError> {
        Ok(())
    }

    async fn stop(&self, _session_id: &SessionId) -> Result<(), CourierError> {
        Ok(())
    }

    async fn session_artifacts_exist(&self, session_id: &SessionId) -> bool {
        self.artifacts.contains(session_id.as_str())
    }

    async fn qr_snapshot(&self, _session_id: &SessionId) -> Option<QrSnapshot> {
        None
    }
}
