// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence collaborator trait backing the session registry.

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::AccountRecord;

/// Backing store for account records.
///
/// The session registry is the only component that writes through this
/// trait; the reconciler reads and deletes during startup cleanup.
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// All persisted account records, across platforms.
    async fn get_all_accounts(&self) -> Result<Vec<AccountRecord>, CourierError>;

    /// Insert a new account record.
    async fn insert_account(&self, record: &AccountRecord) -> Result<(), CourierError>;

    /// Delete the record whose `account_id` equals `session_id`.
    ///
    /// Deleting a non-existent record is not an error.
    async fn delete_account_by_session_id(&self, session_id: &str) -> Result<(), CourierError>;
}
