// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the AccountStore trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use courier_config::model::StorageConfig;
use courier_core::{AccountRecord, AccountStore, CourierError};

use crate::database::Database;
use crate::queries;

/// SQLite-backed account store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily initialized on the first
/// call to [`SqliteAccountStore::initialize`].
pub struct SqliteAccountStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteAccountStore {
    /// Create a new SqliteAccountStore with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: SqliteAccountStore::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, CourierError> {
        self.db.get().ok_or_else(|| CourierError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    /// Open the database at the configured path and run migrations.
    pub async fn initialize(&self) -> Result<(), CourierError> {
        let path = self.config.database_path.clone();
        let db = Database::open(&path).await?;
        self.db.set(db).map_err(|_| CourierError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite account store initialized");
        Ok(())
    }

    /// Checkpoint the WAL ahead of process shutdown.
    pub async fn close(&self) -> Result<(), CourierError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn get_all_accounts(&self) -> Result<Vec<AccountRecord>, CourierError> {
        queries::accounts::list_accounts(self.db()?, None).await
    }

    async fn insert_account(&self, record: &AccountRecord) -> Result<(), CourierError> {
        queries::accounts::insert_account(self.db()?, record).await
    }

    async fn delete_account_by_session_id(&self, session_id: &str) -> Result<(), CourierError> {
        let removed = queries::accounts::delete_account(self.db()?, session_id).await?;
        if !removed {
            debug!(session_id, "delete: no matching account record");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::Platform;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
        }
    }

    fn make_record(id: &str) -> AccountRecord {
        AccountRecord {
            account_id: id.to_string(),
            platform: Platform::Whatsapp,
            workspace_id: Some(1),
            brand_id: None,
            label: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init_test.db");
        let store = SqliteAccountStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let store = SqliteAccountStore::new(make_config(db_path.to_str().unwrap()));

        store.initialize().await.unwrap();
        let result = store.initialize().await;
        assert!(result.is_err(), "second initialize should fail");
    }

    #[tokio::test]
    async fn queries_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("no_init.db");
        let store = SqliteAccountStore::new(make_config(db_path.to_str().unwrap()));

        let result = store.get_all_accounts().await;
        assert!(result.is_err(), "queries should fail before initialize");
    }

    #[tokio::test]
    async fn full_account_lifecycle_through_store() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lifecycle.db");
        let store = SqliteAccountStore::new(make_config(db_path.to_str().unwrap()));
        store.initialize().await.unwrap();

        store.insert_account(&make_record("wa-life")).await.unwrap();

        let all = store.get_all_accounts().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].account_id, "wa-life");

        store.delete_account_by_session_id("wa-life").await.unwrap();
        // Deleting again is not an error.
        store.delete_account_by_session_id("wa-life").await.unwrap();

        let all = store.get_all_accounts().await.unwrap();
        assert!(all.is_empty());

        store.close().await.unwrap();
    }
}
