// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider connection manager trait for messaging platform integrations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::CourierError;
use crate::types::{MediaDownloaded, MessageEnvelope, Platform, SessionId};

/// Out-of-band notification produced by a provider for the broadcast hub.
#[derive(Debug, Clone)]
pub enum ProviderEvent {
    /// A normalized inbound message.
    Message(MessageEnvelope),
    /// A media attachment finished downloading.
    MediaDownloaded(MediaDownloaded),
    /// The platform side logged the account out.
    LoggedOut {
        account_id: String,
        display_name: Option<String>,
    },
}

/// Callback invoked by a provider for every [`ProviderEvent`].
pub type OnEvent = Arc<dyn Fn(ProviderEvent) + Send + Sync>;

/// QR login artifact snapshot, served by the HTTP QR endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrSnapshot {
    /// Renderable `data:` URL for the dashboard.
    pub data_url: String,
    /// Remaining validity; zero means the artifact just expired.
    pub expires_in: Duration,
}

/// One connection manager per messaging platform (WhatsApp, Telegram).
///
/// Owns the platform automation handles and turns raw platform payloads
/// into [`MessageEnvelope`]s. Implementations never write session status
/// directly; they propose transitions through the session registry.
#[async_trait]
pub trait ProviderConnection: Send + Sync + 'static {
    /// Human-readable adapter name.
    fn name(&self) -> &str;

    /// The platform this manager serves.
    fn platform(&self) -> Platform;

    /// Semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Start the shared listening loop for all currently ready sessions of
    /// this platform, delivering every provider event to `on_event`.
    ///
    /// Idempotent: a second call must not register duplicate listeners.
    async fn start(&self, on_event: OnEvent) -> Result<(), CourierError>;

    /// Attach listening for a single account, used when an account becomes
    /// ready after the initial `start` (for example a fresh QR login).
    ///
    /// Safe to call before `start`; the session is queued until the shared
    /// callback exists. Duplicate calls for the same session must not
    /// produce duplicate message delivery.
    async fn start_account_listening(&self, session_id: &SessionId) -> Result<(), CourierError>;

    /// Tear down the platform client handle for one account. Idempotent.
    async fn stop(&self, session_id: &SessionId) -> Result<(), CourierError>;

    /// Whether an external credential artifact exists for this session
    /// (session directory/data file, or an entry in the platform's session
    /// list). Used by the startup reconciler to detect orphan records.
    async fn session_artifacts_exist(&self, session_id: &SessionId) -> bool;

    /// The current QR login artifact for the session, if one is live.
    ///
    /// `None` both before the platform has produced a code and after the
    /// previous code expired.
    async fn qr_snapshot(&self, session_id: &SessionId) -> Option<QrSnapshot>;
}

/// Registry of provider connection managers, keyed by platform.
///
/// Constructed once at bootstrap; components receive a shared handle and
/// look providers up by platform instead of probing capabilities at
/// runtime.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn ProviderConnection>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. Later registrations for the same platform
    /// replace earlier ones.
    pub fn register(&mut self, provider: Arc<dyn ProviderConnection>) {
        self.providers
            .retain(|p| p.platform() != provider.platform());
        self.providers.push(provider);
    }

    /// Look up the provider for a platform.
    pub fn get(&self, platform: Platform) -> Result<Arc<dyn ProviderConnection>, CourierError> {
        self.providers
            .iter()
            .find(|p| p.platform() == platform)
            .cloned()
            .ok_or_else(|| CourierError::ProviderUnavailable {
                platform: platform.to_string(),
            })
    }

    /// All registered providers.
    pub fn all(&self) -> &[Arc<dyn ProviderConnection>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
