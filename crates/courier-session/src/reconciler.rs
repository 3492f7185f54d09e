// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup reconciliation of persisted accounts against platform artifacts.
//!
//! Runs once before providers start. An account row whose platform
//! credential artifact no longer exists is an orphan and gets pruned, so
//! providers never try to revive a session the platform has forgotten.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use courier_core::{AccountStore, CourierError, ProviderRegistry, SessionId};

/// Outcome counters for one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub examined: usize,
    pub pruned: usize,
    pub skipped_recent: usize,
    pub failed: usize,
}

/// Prune orphaned account records.
///
/// Best-effort per record: a failure on one record is logged and counted,
/// never aborting the rest of the pass. Records younger than `grace` are
/// skipped so a session being created concurrently is not torn down before
/// its artifacts land on disk. Idempotent; a second pass over an already
/// clean store prunes nothing.
pub async fn reconcile_sessions(
    store: &Arc<dyn AccountStore>,
    providers: &ProviderRegistry,
    grace: Duration,
) -> Result<ReconcileReport, CourierError> {
    let accounts = store.get_all_accounts().await?;
    let mut report = ReconcileReport {
        examined: accounts.len(),
        ..Default::default()
    };
    let now = Utc::now();

    for account in accounts {
        if let Ok(created) = DateTime::parse_from_rfc3339(&account.created_at) {
            let age = (now - created.with_timezone(&Utc))
                .to_std()
                .unwrap_or(Duration::ZERO);
            if age < grace {
                debug!(
                    account_id = %account.account_id,
                    age_secs = age.as_secs(),
                    "skipping recently created account"
                );
                report.skipped_recent += 1;
                continue;
            }
        }

        let provider = match providers.get(account.platform) {
            Ok(p) => p,
            Err(e) => {
                warn!(
                    account_id = %account.account_id,
                    platform = %account.platform,
                    error = %e,
                    "no provider for account, leaving record untouched"
                );
                report.failed += 1;
                continue;
            }
        };

        let session_id = SessionId(account.account_id.clone());
        if provider.session_artifacts_exist(&session_id).await {
            continue;
        }

        match store
            .delete_account_by_session_id(&account.account_id)
            .await
        {
            Ok(()) => {
                info!(
                    account_id = %account.account_id,
                    platform = %account.platform,
                    "pruned orphaned account record"
                );
                report.pruned += 1;
            }
            Err(e) => {
                warn!(
                    account_id = %account.account_id,
                    error = %e,
                    "failed to prune orphaned account record"
                );
                report.failed += 1;
            }
        }
    }

    info!(
        examined = report.examined,
        pruned = report.pruned,
        skipped = report.skipped_recent,
        failed = report.failed,
        "session reconciliation complete"
    );
    Ok(report)
}
