// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account CRUD operations.

use courier_core::{AccountRecord, CourierError, Platform};
use rusqlite::params;
use std::str::FromStr;

use crate::database::Database;

fn row_to_account(row: &rusqlite::Row<'_>) -> Result<AccountRecord, rusqlite::Error> {
    let platform: String = row.get(1)?;
    Ok(AccountRecord {
        account_id: row.get(0)?,
        platform: Platform::from_str(&platform).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?,
        workspace_id: row.get(2)?,
        brand_id: row.get(3)?,
        label: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Insert a new account record, or replace the existing one with the same id.
pub async fn insert_account(db: &Database, account: &AccountRecord) -> Result<(), CourierError> {
    let account = account.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO accounts
                 (account_id, platform, workspace_id, brand_id, label, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    account.account_id,
                    account.platform.to_string(),
                    account.workspace_id,
                    account.brand_id,
                    account.label,
                    account.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get an account by ID.
pub async fn get_account(db: &Database, id: &str) -> Result<Option<AccountRecord>, CourierError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT account_id, platform, workspace_id, brand_id, label, created_at
                 FROM accounts WHERE account_id = ?1",
            )?;
            let result = stmt.query_row(params![id], row_to_account);
            match result {
                Ok(account) => Ok(Some(account)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// List all accounts, optionally filtered by platform.
pub async fn list_accounts(
    db: &Database,
    platform: Option<Platform>,
) -> Result<Vec<AccountRecord>, CourierError> {
    db.connection()
        .call(move |conn| {
            let mut accounts = Vec::new();
            match platform {
                Some(p) => {
                    let mut stmt = conn.prepare(
                        "SELECT account_id, platform, workspace_id, brand_id, label, created_at
                         FROM accounts WHERE platform = ?1 ORDER BY created_at DESC",
                    )?;
                    let rows = stmt.query_map(params![p.to_string()], row_to_account)?;
                    for row in rows {
                        accounts.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        "SELECT account_id, platform, workspace_id, brand_id, label, created_at
                         FROM accounts ORDER BY created_at DESC",
                    )?;
                    let rows = stmt.query_map([], row_to_account)?;
                    for row in rows {
                        accounts.push(row?);
                    }
                }
            }
            Ok(accounts)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete an account by ID. Deleting a missing account is not an error;
/// returns whether a row was actually removed.
pub async fn delete_account(db: &Database, id: &str) -> Result<bool, CourierError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM accounts WHERE account_id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
