// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP bridge implementation of [`WaClient`].
//!
//! The WhatsApp automation runs as a local sidecar process. This client
//! opens a session over its HTTP surface and long-polls the per-session
//! event feed:
//!
//! - `POST /wa/sessions/{id}/connect`
//! - `GET  /wa/sessions/{id}/events` (long poll, JSON array of events)
//! - `POST /wa/sessions/{id}/disconnect`

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::StatusCode;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use courier_core::{CourierError, SessionId};

use crate::client::{WaClient, WaClientEvent};

const EVENT_CHANNEL_CAPACITY: usize = 64;
const POLL_RETRY_DELAY: Duration = Duration::from_secs(1);

/// [`WaClient`] backed by the automation sidecar's HTTP surface.
pub struct BridgeWaClient {
    http: reqwest::Client,
    base_url: String,
    polls: DashMap<String, CancellationToken>,
}

impl BridgeWaClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, CourierError> {
        let http = reqwest::Client::builder()
            // Must sit above the sidecar's long-poll window.
            .timeout(Duration::from_secs(40))
            .build()
            .map_err(|e| CourierError::Provider {
                message: format!("failed to build bridge HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            polls: DashMap::new(),
        })
    }

    fn session_url(&self, session_id: &SessionId, tail: &str) -> String {
        format!("{}/wa/sessions/{}/{tail}", self.base_url, session_id)
    }
}

async fn poll_once(http: &reqwest::Client, url: &str) -> Result<Vec<WaClientEvent>, PollError> {
    let response = http.get(url).send().await.map_err(PollError::Transport)?;
    match response.status() {
        status if status.is_success() => response.json().await.map_err(PollError::Transport),
        StatusCode::NOT_FOUND | StatusCode::GONE => Err(PollError::SessionGone),
        status => Err(PollError::Status(status)),
    }
}

enum PollError {
    Transport(reqwest::Error),
    SessionGone,
    Status(StatusCode),
}

#[async_trait]
impl WaClient for BridgeWaClient {
    async fn connect(
        &self,
        session_id: &SessionId,
    ) -> Result<mpsc::Receiver<WaClientEvent>, CourierError> {
        let response = self
            .http
            .post(self.session_url(session_id, "connect"))
            .send()
            .await
            .map_err(|e| CourierError::Provider {
                message: format!("bridge connect failed for {session_id}: {e}"),
                source: Some(Box::new(e)),
            })?;
        if !response.status().is_success() {
            return Err(CourierError::Provider {
                message: format!(
                    "bridge refused session {session_id}: {}",
                    response.status()
                ),
                source: None,
            });
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        if let Some(previous) = self
            .polls
            .insert(session_id.0.clone(), cancel.clone())
        {
            previous.cancel();
        }

        let events_url = self.session_url(session_id, "events");
        let client = self.http.clone();
        let sid = session_id.clone();
        let poll_cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                let batch = tokio::select! {
                    result = poll_once(&client, &events_url) => result,
                    _ = poll_cancel.cancelled() => break,
                };
                match batch {
                    Ok(events) => {
                        for event in events {
                            if tx.send(event).await.is_err() {
                                debug!(session_id = %sid, "event receiver dropped, poll ending");
                                return;
                            }
                        }
                    }
                    Err(PollError::SessionGone) => {
                        let _ = tx
                            .send(WaClientEvent::Disconnected {
                                reason: "bridge session gone".into(),
                            })
                            .await;
                        break;
                    }
                    Err(PollError::Status(status)) => {
                        warn!(session_id = %sid, %status, "bridge event poll rejected");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                    }
                    Err(PollError::Transport(e)) => {
                        warn!(session_id = %sid, error = %e, "bridge event poll failed");
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn disconnect(&self, session_id: &SessionId) -> Result<(), CourierError> {
        if let Some((_, cancel)) = self.polls.remove(session_id.as_str()) {
            cancel.cancel();
        }
        let response = self
            .http
            .post(self.session_url(session_id, "disconnect"))
            .send()
            .await
            .map_err(|e| CourierError::Provider {
                message: format!("bridge disconnect failed for {session_id}: {e}"),
                source: Some(Box::new(e)),
            })?;
        // Unknown sessions are fine, teardown is idempotent.
        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            warn!(
                session_id = %session_id,
                status = %response.status(),
                "bridge disconnect returned error status"
            );
        }
        Ok(())
    }
}
