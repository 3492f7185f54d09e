// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram provider connection manager for the Courier relay.
//!
//! Implements [`ProviderConnection`] on top of an injected [`TgClient`]
//! automation handle. Unlike WhatsApp, Telegram reports QR logins as raw
//! token payloads; this crate renders them into SVG data URLs before they
//! hit the QR store.

pub mod bridge;
pub mod client;
pub mod normalize;
pub mod qr;
pub mod sessions_file;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use courier_bus::{AccountBus, AccountEvent};
use courier_config::model::SessionsConfig;
use courier_core::qr::QrStore;
use courier_core::{
    CourierError, OnEvent, Platform, ProviderConnection, ProviderEvent, QrSnapshot, SessionId,
    SessionStatus,
};
use courier_session::SessionRegistry;

use crate::client::{TgClient, TgClientEvent};

/// Telegram provider implementing [`ProviderConnection`].
pub struct TelegramProvider {
    config: SessionsConfig,
    client: Arc<dyn TgClient>,
    registry: Arc<SessionRegistry>,
    bus: Arc<AccountBus>,
    qr_store: Arc<QrStore>,
    on_event: OnceCell<OnEvent>,
    pending: Mutex<Vec<SessionId>>,
    listeners: DashMap<String, JoinHandle<()>>,
}

impl TelegramProvider {
    pub fn new(
        config: SessionsConfig,
        client: Arc<dyn TgClient>,
        registry: Arc<SessionRegistry>,
        bus: Arc<AccountBus>,
    ) -> Self {
        let qr_ttl = Duration::from_secs(config.qr_ttl_secs);
        Self {
            config,
            client,
            registry,
            bus,
            qr_store: Arc::new(QrStore::new(qr_ttl)),
            on_event: OnceCell::new(),
            pending: Mutex::new(Vec::new()),
            listeners: DashMap::new(),
        }
    }

    async fn spawn_listener(&self, session_id: &SessionId) -> Result<(), CourierError> {
        if self.listeners.contains_key(session_id.as_str()) {
            debug!(session_id = %session_id, "listener already attached");
            return Ok(());
        }
        let on_event = self
            .on_event
            .get()
            .cloned()
            .ok_or_else(|| CourierError::Provider {
                message: "telegram provider not started".into(),
                source: None,
            })?;

        let mut rx = self.client.connect(session_id).await?;
        let registry = self.registry.clone();
        let bus = self.bus.clone();
        let qr_store = self.qr_store.clone();
        let sid = session_id.clone();

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event {
                    TgClientEvent::QrToken { payload } => match qr::render_data_url(&payload) {
                        Ok(data_url) => {
                            qr_store.put(&sid, data_url);
                            propose(&registry, &bus, &sid, SessionStatus::QrReady).await;
                        }
                        Err(e) => {
                            error!(session_id = %sid, error = %e, "failed to render QR token");
                        }
                    },
                    TgClientEvent::QrScanned => {
                        propose(&registry, &bus, &sid, SessionStatus::QrScanned).await;
                    }
                    TgClientEvent::Connected { display_name } => {
                        debug!(session_id = %sid, ?display_name, "telegram session connected");
                        qr_store.clear(&sid);
                        propose(&registry, &bus, &sid, SessionStatus::Ready).await;
                    }
                    TgClientEvent::Update(raw) => {
                        let envelope = normalize::to_envelope(sid.as_str(), raw);
                        on_event(ProviderEvent::Message(envelope));
                    }
                    TgClientEvent::MediaDownloaded {
                        file_path,
                        message_id,
                        media_type,
                    } => {
                        on_event(ProviderEvent::MediaDownloaded(
                            courier_core::MediaDownloaded {
                                file_path,
                                message_id,
                                media_type,
                                account_id: sid.0.clone(),
                            },
                        ));
                    }
                    TgClientEvent::LoggedOut { display_name } => {
                        info!(session_id = %sid, "telegram session logged out");
                        on_event(ProviderEvent::LoggedOut {
                            account_id: sid.0.clone(),
                            display_name,
                        });
                        propose(&registry, &bus, &sid, SessionStatus::Disconnected).await;
                        break;
                    }
                    TgClientEvent::Disconnected { reason } => {
                        warn!(session_id = %sid, reason, "telegram client disconnected");
                        propose(&registry, &bus, &sid, SessionStatus::Disconnected).await;
                        break;
                    }
                }
            }
            debug!(session_id = %sid, "telegram listener finished");
        });

        self.listeners.insert(session_id.0.clone(), handle);
        info!(session_id = %session_id, "telegram listener attached");
        Ok(())
    }
}

/// Apply a status transition and broadcast it when accepted.
async fn propose(
    registry: &SessionRegistry,
    bus: &AccountBus,
    session_id: &SessionId,
    status: SessionStatus,
) {
    match registry.set_status(session_id, status).await {
        Ok(true) => {
            bus.publish(AccountEvent::StatusChanged {
                account_id: session_id.0.clone(),
                status,
            });
        }
        Ok(false) => {}
        Err(e) => warn!(session_id = %session_id, error = %e, "status transition failed"),
    }
}

#[async_trait]
impl ProviderConnection for TelegramProvider {
    fn name(&self) -> &str {
        "telegram"
    }

    fn platform(&self) -> Platform {
        Platform::Telegram
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn start(&self, on_event: OnEvent) -> Result<(), CourierError> {
        if self.on_event.set(on_event).is_err() {
            debug!("telegram provider already started");
            return Ok(());
        }
        info!("starting telegram provider");

        let queued: Vec<SessionId> = std::mem::take(&mut *self.pending.lock().await);
        for session_id in queued {
            if let Err(e) = self.spawn_listener(&session_id).await {
                warn!(session_id = %session_id, error = %e, "failed to attach queued listener");
            }
        }

        for record in self.registry.list_by_platform(Platform::Telegram).await {
            if record.status != SessionStatus::Ready {
                continue;
            }
            if let Err(e) = self.spawn_listener(&record.session_id).await {
                warn!(
                    session_id = %record.session_id,
                    error = %e,
                    "failed to attach listener for ready session"
                );
            }
        }
        Ok(())
    }

    async fn start_account_listening(&self, session_id: &SessionId) -> Result<(), CourierError> {
        if self.on_event.get().is_none() {
            let mut pending = self.pending.lock().await;
            if !pending.contains(session_id) {
                debug!(session_id = %session_id, "queueing session until provider start");
                pending.push(session_id.clone());
            }
            return Ok(());
        }
        self.spawn_listener(session_id).await
    }

    async fn stop(&self, session_id: &SessionId) -> Result<(), CourierError> {
        if let Some((_, handle)) = self.listeners.remove(session_id.as_str()) {
            handle.abort();
        }
        self.qr_store.clear(session_id);
        self.client.disconnect(session_id).await?;
        info!(session_id = %session_id, "telegram session stopped");
        Ok(())
    }

    async fn session_artifacts_exist(&self, session_id: &SessionId) -> bool {
        sessions_file::session_listed(&self.config.data_dir, session_id.as_str())
    }

    async fn qr_snapshot(&self, session_id: &SessionId) -> Option<QrSnapshot> {
        self.qr_store.get(session_id)
    }
}
