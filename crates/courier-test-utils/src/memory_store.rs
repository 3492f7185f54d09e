// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory account store for deterministic tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use courier_core::{AccountRecord, AccountStore, CourierError};

/// `AccountStore` backed by a plain vector, no persistence.
#[derive(Default)]
pub struct MemoryAccountStore {
    records: Mutex<Vec<AccountRecord>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current records for assertions.
    pub async fn records(&self) -> Vec<AccountRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
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
