// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve` command implementation.
//!
//! Bootstrap order matters: storage first, then the startup reconciler
//! (against registered but not-yet-started providers), then provider
//! event loops, then the reconnect pass for surviving accounts, and the
//! HTTP/WebSocket transport last.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use courier_bus::AccountBus;
use courier_config::model::CourierConfig;
use courier_core::{
    AccountStore, CourierError, OnEvent, ProviderRegistry, SessionId, SessionStatus,
};
use courier_hub::{hub_fanout, spawn_account_listener, start_server, AppState, BroadcastHub};
use courier_session::{reconcile_sessions, SessionRegistry};
use courier_storage::SqliteAccountStore;
use courier_telegram::bridge::BridgeTgClient;
use courier_telegram::TelegramProvider;
use courier_whatsapp::bridge::BridgeWaClient;
use courier_whatsapp::WhatsappProvider;

const BUS_CAPACITY: usize = 256;

/// Runs the `courier serve` command.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    init_tracing(&config.relay.log_level);
    info!(name = config.relay.name.as_str(), "starting courier serve");

    // Storage.
    let store = SqliteAccountStore::new(config.storage.clone());
    store.initialize().await?;
    let store: Arc<dyn AccountStore> = Arc::new(store);

    let registry = Arc::new(SessionRegistry::new(store.clone()));
    let bus = Arc::new(AccountBus::new(BUS_CAPACITY));
    let hub = Arc::new(BroadcastHub::new());

    // Platform providers over their automation bridges.
    let wa_client = Arc::new(BridgeWaClient::new(&config.providers.whatsapp_bridge_url)?);
    let tg_client = Arc::new(BridgeTgClient::new(&config.providers.telegram_bridge_url)?);
    let mut providers = ProviderRegistry::new();
    providers.register(Arc::new(WhatsappProvider::new(
        config.sessions.clone(),
        wa_client,
        registry.clone(),
        bus.clone(),
    )));
    providers.register(Arc::new(TelegramProvider::new(
        config.sessions.clone(),
        tg_client,
        registry.clone(),
        bus.clone(),
    )));
    let providers = Arc::new(providers);

    // Prune accounts whose platform artifacts vanished while we were down.
    let grace = Duration::from_secs(config.sessions.reconcile_grace_secs);
    match reconcile_sessions(&store, &providers, grace).await {
        Ok(report) => info!(
            examined = report.examined,
            pruned = report.pruned,
            skipped_recent = report.skipped_recent,
            failed = report.failed,
            "session reconciliation complete"
        ),
        Err(e) => warn!(error = %e, "session reconciliation failed, continuing"),
    }

    // Start provider event loops with the hub fan-out callback.
    let on_event = hub_fanout(hub.clone());
    start_providers(&providers, &on_event).await;

    // Reconnect pass: accounts that survived reconciliation resume
    // listening. Each account is wrapped on its own so one platform's
    // failure never blocks the other.
    reconnect_persisted_accounts(&store, &registry, &providers).await?;

    if spawn_account_listener(bus.clone(), hub.clone(), providers.clone()).is_none() {
        debug!("hub account listener already wired");
    }

    let cancel = install_signal_handler();

    let state = AppState {
        hub,
        bus,
        registry,
        providers,
    };
    start_server(&config.server, state, cancel).await?;

    info!("courier serve shutdown complete");
    Ok(())
}

/// Starts every registered provider with the shared event callback.
///
/// Each platform is wrapped on its own: a failed start is logged and the
/// relay continues serving the platforms that did come up.
async fn start_providers(providers: &ProviderRegistry, on_event: &OnEvent) {
    for provider in providers.all() {
        if let Err(e) = provider.start(on_event.clone()).await {
            error!(
                provider = provider.name(),
                error = %e,
                "provider start failed, continuing without it"
            );
        }
    }
}

/// Restores persisted accounts into the live registry and restarts their
/// platform listeners. Per-account failures are logged and skipped.
async fn reconnect_persisted_accounts(
    store: &Arc<dyn AccountStore>,
    registry: &Arc<SessionRegistry>,
    providers: &Arc<ProviderRegistry>,
) -> Result<(), CourierError> {
    let accounts = store.get_all_accounts().await?;
    if accounts.is_empty() {
        debug!("no persisted accounts to reconnect");
        return Ok(());
    }
    info!(count = accounts.len(), "reconnecting persisted accounts");

    for account in accounts {
        registry.restore(&account, SessionStatus::Connecting).await;
        let session_id = SessionId(account.account_id.clone());
        match providers.get(account.platform) {
            Ok(provider) => {
                if let Err(e) = provider.start_account_listening(&session_id).await {
                    warn!(
                        session_id = %session_id,
                        platform = %account.platform,
                        error = %e,
                        "reconnect failed for account"
                    );
                }
            }
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    platform = %account.platform,
                    error = %e,
                    "no provider for persisted account"
                );
            }
        }
    }
    Ok(())
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] cancelled when either signal arrives.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    error!(error = %e, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    token_clone.cancel();
                    return;
                }
            };

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
