// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock provider connection manager for deterministic testing.
//!
//! `MockProvider` implements `ProviderConnection` with injectable events
//! and captured lifecycle calls for assertion in tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use courier_core::{
    CourierError, OnEvent, Platform, ProviderConnection, ProviderEvent, QrSnapshot, SessionId,
};

/// A scriptable provider for one platform.
///
/// Lifecycle calls are recorded, `inject()` pushes events through whatever
/// callback `start()` installed, and artifact/QR answers are settable so
/// reconciler and HTTP surface tests can script both sides.
pub struct MockProvider {
    platform: Platform,
    on_event: Mutex<Option<OnEvent>>,
    start_calls: AtomicUsize,
    listening: Mutex<Vec<String>>,
    stopped: Mutex<Vec<String>>,
    artifacts: Mutex<HashSet<String>>,
    qr: DashMap<String, QrSnapshot>,
}

impl MockProvider {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            on_event: Mutex::new(None),
            start_calls: AtomicUsize::new(0),
            listening: Mutex::new(Vec::new()),
            stopped: Mutex::new(Vec::new()),
            artifacts: Mutex::new(HashSet::new()),
            qr: DashMap::new(),
        }
    }

    /// Deliver an event through the installed callback.
    ///
    /// Panics if `start()` has not installed one; tests that exercise the
    /// pre-start queue should assert on `listening()` instead.
    pub async fn inject(&self, event: ProviderEvent) {
        let guard = self.on_event.lock().await;
        let on_event = guard
            .as_ref()
            .expect("MockProvider::inject before start()");
        on_event(event);
    }

    /// Whether `start()` installed a callback yet.
    pub async fn is_started(&self) -> bool {
        self.on_event.lock().await.is_some()
    }

    /// Number of times `start()` was called.
    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    /// Every `start_account_listening` call, in order, duplicates included.
    pub async fn listening(&self) -> Vec<String> {
        self.listening.lock().await.clone()
    }

    /// Every `stop` call, in order.
    pub async fn stopped(&self) -> Vec<String> {
        self.stopped.lock().await.clone()
    }

    /// Mark a session as having on-platform credential artifacts.
    pub async fn set_artifacts(&self, session_id: &str, present: bool) {
        let mut artifacts = self.artifacts.lock().await;
        if present {
            artifacts.insert(session_id.to_string());
        } else {
            artifacts.remove(session_id);
        }
    }

    /// Script the QR snapshot answer for a session.
    pub fn set_qr(&self, session_id: &str, snapshot: Option<QrSnapshot>) {
        match snapshot {
            Some(s) => {
                self.qr.insert(session_id.to_string(), s);
            }
            None => {
                self.qr.remove(session_id);
            }
        }
    }
}

#[async_trait]
impl ProviderConnection for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn platform(&self) -> Platform {
        self.platform
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn start(&self, on_event: OnEvent) -> Result<(), CourierError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.on_event.lock().await;
        if guard.is_none() {
            *guard = Some(on_event);
        }
        Ok(())
    }

    async fn start_account_listening(&self, session_id: &SessionId) -> Result<(), CourierError> {
        self.listening.lock().await.push(session_id.0.clone());
        Ok(())
    }

    async fn stop(&self, session_id: &SessionId) -> Result<(), CourierError> {
        self.stopped.lock().await.push(session_id.0.clone());
        Ok(())
    }

    async fn session_artifacts_exist(&self, session_id: &SessionId) -> bool {
        self.artifacts.lock().await.contains(session_id.as_str())
    }

    async fn qr_snapshot(&self, session_id: &SessionId) -> Option<QrSnapshot> {
        self.qr.get(session_id.as_str()).map(|s| s.clone())
    }
}
