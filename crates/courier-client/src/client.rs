// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! API client with single-flight token refresh.
//!
//! Any number of requests may hit 401 at once; exactly one
//! `POST /auth/refresh` goes out, every 401 observer awaits the same
//! shared future, and each observer retries its original request once
//! when the refresh succeeds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::{Method, Response, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ClientError;

type RefreshFuture = Shared<BoxFuture<'static, bool>>;

/// Called when a refresh attempt fails and the session is gone for good.
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// HTTP client for the relay's API, sharing the ambient cookie credential.
///
/// Cheap to clone; clones share the cookie jar and the refresh gate.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    refresh_gate: Arc<Mutex<Option<RefreshFuture>>>,
    expired_notified: Arc<AtomicBool>,
    on_session_expired: Option<SessionExpiredHook>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            refresh_gate: Arc::new(Mutex::new(None)),
            expired_notified: Arc::new(AtomicBool::new(false)),
            on_session_expired: None,
        })
    }

    /// Install the hook invoked once when a refresh fails.
    pub fn with_session_expired_hook(mut self, hook: SessionExpiredHook) -> Self {
        self.on_session_expired = Some(hook);
        self
    }

    /// Forget refresh state after an explicit logout or login.
    ///
    /// The next 401 starts a fresh refresh cycle and the expired hook may
    /// fire again.
    pub fn reset_auth_state(&self) {
        self.refresh_gate
            .lock()
            .expect("refresh gate poisoned")
            .take();
        self.expired_notified.store(false, Ordering::SeqCst);
    }

    pub async fn get(&self, path: &str) -> Result<Response, ClientError> {
        self.call(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Response, ClientError> {
        self.call(Method::POST, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, ClientError> {
        self.call(Method::DELETE, path, None).await
    }

    /// Perform a request, transparently refreshing the session on 401.
    ///
    /// Non-401 responses pass through untouched, error statuses included;
    /// callers inspect the status themselves.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ClientError> {
        let response = self.send(method.clone(), path, body).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(%method, path, "401 received, coordinating refresh");
        if !self.refresh_session().await {
            return Err(ClientError::Unauthorized);
        }

        // Exactly one retry of the original request.
        let retried = self.send(method, path, body).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        Ok(retried)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Claim or join the in-flight refresh. Returns whether it succeeded.
    ///
    /// The slot is cleared after the shared future settles, on success and
    /// failure alike, so a later 401 can attempt a fresh refresh.
    async fn refresh_session(&self) -> bool {
        let fut = {
            let mut gate = self.refresh_gate.lock().expect("refresh gate poisoned");
            match gate.as_ref() {
                Some(in_flight) => {
                    debug!("joining in-flight session refresh");
                    in_flight.clone()
                }
                None => {
                    let claimed = self.make_refresh_future();
                    *gate = Some(claimed.clone());
                    claimed
                }
            }
        };

        let ok = fut.clone().await;

        let mut gate = self.refresh_gate.lock().expect("refresh gate poisoned");
        if gate.as_ref().is_some_and(|slot| slot.ptr_eq(&fut)) {
            gate.take();
        }
        ok
    }

    fn make_refresh_future(&self) -> RefreshFuture {
        let http = self.http.clone();
        let url = format!("{}/auth/refresh", self.base_url);
        let hook = self.on_session_expired.clone();
        let notified = self.expired_notified.clone();

        async move {
            let ok = match http.post(&url).send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(%status, "session refresh response");
                    status.is_success()
                }
                Err(e) => {
                    warn!(error = %e, "session refresh request failed");
                    false
                }
            };
            if !ok && !notified.swap(true, Ordering::SeqCst) {
                if let Some(hook) = hook {
                    hook();
                }
            }
            ok
        }
        .boxed()
        .shared()
    }
}
