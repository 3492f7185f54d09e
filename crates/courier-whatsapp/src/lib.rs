// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp provider connection manager for the Courier relay.
//!
//! Implements [`ProviderConnection`] on top of an injected [`WaClient`]
//! automation handle: per-account listener tasks, QR artifact tracking,
//! and normalization of raw platform payloads into the unified envelope.

pub mod artifacts;
pub mod bridge;
pub mod client;
pub mod normalize;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use courier_bus::{AccountBus, AccountEvent};
use courier_config::model::SessionsConfig;
use courier_core::qr::QrStore;
use courier_core::{
    CourierError, OnEvent, Platform, ProviderConnection, ProviderEvent, QrSnapshot, SessionId,
    SessionStatus,
};
use courier_session::SessionRegistry;

use crate::client::{WaClient, WaClientEvent};

/// WhatsApp provider implementing [`ProviderConnection`].
pub struct WhatsappProvider {
    config: SessionsConfig,
    client: Arc<dyn WaClient>,
    registry: Arc<SessionRegistry>,
    bus: Arc<AccountBus>,
    qr_store: Arc<QrStore>,
    on_event: OnceCell<OnEvent>,
    /// Sessions queued by `start_account_listening` before `start` ran.
    pending: Mutex<Vec<SessionId>>,
    listeners: DashMap<String, JoinHandle<()>>,
}

impl WhatsappProvider {
    pub fn new(
        config: SessionsConfig,
        client: Arc<dyn WaClient>,
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

    /// Attach the per-session event loop. Assumes the shared callback is set.
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
                message: "whatsapp provider not started".into(),
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
                    WaClientEvent::Qr { data_url } => {
                        qr_store.put(&sid, data_url);
                        propose(&registry, &bus, &sid, SessionStatus::QrReady).await;
                    }
                    WaClientEvent::QrScanned => {
                        propose(&registry, &bus, &sid, SessionStatus::QrScanned).await;
                    }
                    WaClientEvent::Connected { display_name } => {
                        debug!(session_id = %sid, ?display_name, "whatsapp session connected");
                        qr_store.clear(&sid);
                        propose(&registry, &bus, &sid, SessionStatus::Ready).await;
                    }
                    WaClientEvent::Message(raw) => {
                        let envelope = normalize::to_envelope(sid.as_str(), raw);
                        on_event(ProviderEvent::Message(envelope));
                    }
                    WaClientEvent::MediaDownloaded {
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
                    WaClientEvent::LoggedOut { display_name } => {
                        info!(session_id = %sid, "whatsapp session logged out");
                        on_event(ProviderEvent::LoggedOut {
                            account_id: sid.0.clone(),
                            display_name,
                        });
                        propose(&registry, &bus, &sid, SessionStatus::Disconnected).await;
                        break;
                    }
                    WaClientEvent::Disconnected { reason } => {
                        warn!(session_id = %sid, reason, "whatsapp client disconnected");
                        propose(&registry, &bus, &sid, SessionStatus::Disconnected).await;
                        break;
                    }
                }
            }
            debug!(session_id = %sid, "whatsapp listener finished");
        });

        self.listeners.insert(session_id.0.clone(), handle);
        info!(session_id = %session_id, "whatsapp listener attached");
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
impl ProviderConnection for WhatsappProvider {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn platform(&self) -> Platform {
        Platform::Whatsapp
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn start(&self, on_event: OnEvent) -> Result<(), CourierError> {
        if self.on_event.set(on_event).is_err() {
            debug!("whatsapp provider already started");
            return Ok(());
        }
        info!("starting whatsapp provider");

        // Sessions queued before the callback existed go first.
        let queued: Vec<SessionId> = std::mem::take(&mut *self.pending.lock().await);
        for session_id in queued {
            if let Err(e) = self.spawn_listener(&session_id).await {
                warn!(session_id = %session_id, error = %e, "failed to attach queued listener");
            }
        }

        // Then every session the registry already considers ready.
        for record in self.registry.list_by_platform(Platform::Whatsapp).await {
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
        info!(session_id = %session_id, "whatsapp session stopped");
        Ok(())
    }

    async fn session_artifacts_exist(&self, session_id: &SessionId) -> bool {
        artifacts::artifacts_exist(&self.config.data_dir, session_id.as_str())
    }

    async fn qr_snapshot(&self, session_id: &SessionId) -> Option<QrSnapshot> {
        self.qr_store.get(session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::sync::mpsc;

    use courier_core::AccountStore;
    use courier_test_utils::MemoryAccountStore;

    use crate::client::WaRawMessage;

    /// Client stub handing out channels the test feeds by hand.
    struct ScriptedWaClient {
        senders: DashMap<String, mpsc::Sender<WaClientEvent>>,
        connects: AtomicUsize,
        disconnects: Mutex<Vec<String>>,
    }

    impl ScriptedWaClient {
        fn new() -> Self {
            Self {
                senders: DashMap::new(),
                connects: AtomicUsize::new(0),
                disconnects: Mutex::new(Vec::new()),
            }
        }

        async fn send(&self, session_id: &SessionId, event: WaClientEvent) {
            let tx = self
                .senders
                .get(session_id.as_str())
                .expect("no connection for session")
                .clone();
            tx.send(event).await.unwrap();
        }
    }

    #[async_trait]
    impl WaClient for ScriptedWaClient {
        async fn connect(
            &self,
            session_id: &SessionId,
        ) -> Result<mpsc::Receiver<WaClientEvent>, CourierError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = mpsc::channel(16);
            self.senders.insert(session_id.0.clone(), tx);
            Ok(rx)
        }

        async fn disconnect(&self, session_id: &SessionId) -> Result<(), CourierError> {
            self.senders.remove(session_id.as_str());
            self.disconnects.lock().await.push(session_id.0.clone());
            Ok(())
        }
    }

    struct Rig {
        provider: WhatsappProvider,
        client: Arc<ScriptedWaClient>,
        registry: Arc<SessionRegistry>,
        bus: Arc<AccountBus>,
        events: Mutex<mpsc::UnboundedReceiver<ProviderEvent>>,
        on_event: OnEvent,
    }

    fn make_rig() -> Rig {
        let store: Arc<dyn AccountStore> = Arc::new(MemoryAccountStore::new());
        let registry = Arc::new(SessionRegistry::new(store));
        let bus = Arc::new(AccountBus::new(64));
        let client = Arc::new(ScriptedWaClient::new());
        let config = SessionsConfig {
            data_dir: "/tmp/courier-wa-test".into(),
            reconcile_grace_secs: 300,
            qr_ttl_secs: 60,
        };
        let provider = WhatsappProvider::new(
            config,
            client.clone(),
            registry.clone(),
            bus.clone(),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let on_event: OnEvent = Arc::new(move |event| {
            let _ = tx.send(event);
        });
        Rig {
            provider,
            client,
            registry,
            bus,
            events: Mutex::new(rx),
            on_event,
        }
    }

    async fn recv_event(rig: &Rig) -> ProviderEvent {
        tokio::time::timeout(Duration::from_secs(2), async {
            rig.events.lock().await.recv().await.unwrap()
        })
        .await
        .expect("timed out waiting for provider event")
    }

    async fn wait_for_status(rig: &Rig, id: &SessionId, status: SessionStatus) {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if rig.registry.get(id).await.map(|r| r.status) == Some(status) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("session never reached {status:?}"));
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let rig = make_rig();
        rig.provider.start(rig.on_event.clone()).await.unwrap();
        rig.provider.start(rig.on_event.clone()).await.unwrap();
        assert_eq!(rig.client.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn sessions_queued_before_start_attach_on_start() {
        let rig = make_rig();
        let id = rig.registry.create(Platform::Whatsapp).await.unwrap();

        rig.provider.start_account_listening(&id).await.unwrap();
        assert_eq!(rig.client.connects.load(Ordering::SeqCst), 0);

        rig.provider.start(rig.on_event.clone()).await.unwrap();
        assert_eq!(rig.client.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn duplicate_listening_delivers_once() {
        let rig = make_rig();
        let id = rig.registry.create(Platform::Whatsapp).await.unwrap();
        rig.provider.start(rig.on_event.clone()).await.unwrap();

        rig.provider.start_account_listening(&id).await.unwrap();
        rig.provider.start_account_listening(&id).await.unwrap();
        assert_eq!(rig.client.connects.load(Ordering::SeqCst), 1);

        rig.client
            .send(
                &id,
                WaClientEvent::Message(WaRawMessage {
                    id: "m1".into(),
                    chat_id: "c1".into(),
                    sender: "s1".into(),
                    content: "once".into(),
                    timestamp: 0,
                    from_me: false,
                    message_type: "chat".into(),
                    chat_name: None,
                    geo: None,
                }),
            )
            .await;

        match recv_event(&rig).await {
            ProviderEvent::Message(envelope) => {
                assert_eq!(envelope.message.content, "once");
                assert_eq!(envelope.account_id, id.as_str());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        // Nothing else queued.
        assert!(rig.events.lock().await.try_recv().is_err());
    }

    #[tokio::test]
    async fn start_attaches_ready_sessions() {
        let rig = make_rig();
        let id = rig.registry.create(Platform::Whatsapp).await.unwrap();
        rig.registry
            .set_status(&id, SessionStatus::Ready)
            .await
            .unwrap();

        rig.provider.start(rig.on_event.clone()).await.unwrap();
        assert_eq!(rig.client.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn qr_flow_updates_status_and_snapshot() {
        let rig = make_rig();
        let id = rig.registry.create(Platform::Whatsapp).await.unwrap();
        rig.provider.start(rig.on_event.clone()).await.unwrap();
        rig.provider.start_account_listening(&id).await.unwrap();

        rig.client
            .send(
                &id,
                WaClientEvent::Qr {
                    data_url: "data:image/png;base64,qr".into(),
                },
            )
            .await;
        wait_for_status(&rig, &id, SessionStatus::QrReady).await;
        let snap = rig.provider.qr_snapshot(&id).await.unwrap();
        assert_eq!(snap.data_url, "data:image/png;base64,qr");
        assert!(snap.expires_in <= Duration::from_secs(60));

        rig.client.send(&id, WaClientEvent::QrScanned).await;
        wait_for_status(&rig, &id, SessionStatus::QrScanned).await;

        rig.client
            .send(&id, WaClientEvent::Connected { display_name: None })
            .await;
        wait_for_status(&rig, &id, SessionStatus::Ready).await;
        assert!(rig.provider.qr_snapshot(&id).await.is_none());
    }

    #[tokio::test]
    async fn disconnect_proposes_status_and_publishes() {
        let rig = make_rig();
        let id = rig.registry.create(Platform::Whatsapp).await.unwrap();
        rig.provider.start(rig.on_event.clone()).await.unwrap();
        rig.provider.start_account_listening(&id).await.unwrap();
        let mut bus_rx = rig.bus.subscribe();

        rig.client
            .send(
                &id,
                WaClientEvent::Disconnected {
                    reason: "socket closed".into(),
                },
            )
            .await;

        wait_for_status(&rig, &id, SessionStatus::Disconnected).await;
        let event = tokio::time::timeout(Duration::from_secs(2), bus_rx.recv())
            .await
            .unwrap()
            .unwrap();
        match event {
            AccountEvent::StatusChanged { account_id, status } => {
                assert_eq!(account_id, id.as_str());
                assert_eq!(status, SessionStatus::Disconnected);
            }
            other => panic!("unexpected bus event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn logged_out_reaches_callback_before_disconnect() {
        let rig = make_rig();
        let id = rig.registry.create(Platform::Whatsapp).await.unwrap();
        rig.provider.start(rig.on_event.clone()).await.unwrap();
        rig.provider.start_account_listening(&id).await.unwrap();

        rig.client
            .send(
                &id,
                WaClientEvent::LoggedOut {
                    display_name: Some("Ada".into()),
                },
            )
            .await;

        match recv_event(&rig).await {
            ProviderEvent::LoggedOut {
                account_id,
                display_name,
            } => {
                assert_eq!(account_id, id.as_str());
                assert_eq!(display_name.as_deref(), Some("Ada"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        wait_for_status(&rig, &id, SessionStatus::Disconnected).await;
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let rig = make_rig();
        let id = rig.registry.create(Platform::Whatsapp).await.unwrap();
        rig.provider.start(rig.on_event.clone()).await.unwrap();
        rig.provider.start_account_listening(&id).await.unwrap();

        rig.provider.stop(&id).await.unwrap();
        rig.provider.stop(&id).await.unwrap();
        let disconnects = rig.client.disconnects.lock().await.clone();
        assert_eq!(disconnects, vec![id.0.clone(), id.0.clone()]);
    }
}
