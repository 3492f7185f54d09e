// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the session and login surface.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use courier_core::{CourierError, Platform, SessionId};

use crate::server::AppState;

/// Error response body, `{"code": ..., "message": ...}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

fn error_response(status: StatusCode, err: &CourierError) -> Response {
    (
        status,
        Json(ErrorBody {
            code: err.code().to_string(),
            message: err.to_string(),
        }),
    )
        .into_response()
}

/// Query string carrying a session id.
#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

impl SessionQuery {
    /// The session id, rejecting absent and blank values alike.
    fn require(&self) -> Result<SessionId, CourierError> {
        match self.session_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(SessionId(id.to_string())),
            _ => Err(CourierError::MissingSessionId),
        }
    }
}

/// GET /health
pub async fn get_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// POST /wa/sessions/create
///
/// Registers a fresh session and kicks off the platform login flow; the
/// dashboard polls the QR endpoint next.
pub async fn create_wa_session(State(state): State<AppState>) -> Response {
    let session_id = match state.registry.create(Platform::Whatsapp).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "failed to create session");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e);
        }
    };

    match state.providers.get(Platform::Whatsapp) {
        Ok(provider) => {
            if let Err(e) = provider.start_account_listening(&session_id).await {
                warn!(session_id = %session_id, error = %e, "login flow failed to start");
            }
        }
        Err(e) => {
            warn!(error = %e, "whatsapp provider unavailable");
            return error_response(StatusCode::SERVICE_UNAVAILABLE, &e);
        }
    }

    info!(session_id = %session_id, "whatsapp session created");
    (StatusCode::OK, Json(json!({"sessionId": session_id}))).into_response()
}

/// GET /wa/sessions/connected
pub async fn get_connected_wa_sessions(State(state): State<AppState>) -> Response {
    let sessions = state.registry.list_by_platform(Platform::Whatsapp).await;
    (StatusCode::OK, Json(json!({"sessions": sessions}))).into_response()
}

/// GET /wa/login/qr?sessionId=
///
/// 200 with the code and expiry headers while a code is live, 202 with a
/// pending body otherwise. The dashboard polls until 200 or gives up.
pub async fn get_wa_login_qr(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Response {
    let session_id = match query.require() {
        Ok(id) => id,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let provider = match state.providers.get(Platform::Whatsapp) {
        Ok(p) => p,
        Err(e) => return error_response(StatusCode::SERVICE_UNAVAILABLE, &e),
    };

    match provider.qr_snapshot(&session_id).await {
        Some(snapshot) => {
            let mut headers = HeaderMap::new();
            headers.insert("X-QR-Status", HeaderValue::from_static("ready"));
            let expires_in = snapshot.expires_in.as_secs().to_string();
            if let Ok(value) = HeaderValue::from_str(&expires_in) {
                headers.insert("X-QR-Expires-In", value);
            }
            (
                StatusCode::OK,
                headers,
                Json(json!({"dataUrl": snapshot.data_url})),
            )
                .into_response()
        }
        None => {
            let mut headers = HeaderMap::new();
            headers.insert("X-QR-Status", HeaderValue::from_static("pending"));
            (StatusCode::ACCEPTED, headers, Json(json!({"pending": true}))).into_response()
        }
    }
}

/// GET /wa/login/status?sessionId=
pub async fn get_wa_login_status(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Response {
    let session_id = match query.require() {
        Ok(id) => id,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    match state.registry.get(&session_id).await {
        Some(record) => (
            StatusCode::OK,
            Json(json!({"ok": true, "status": record.status})),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"ok": false, "status": null})),
        )
            .into_response(),
    }
}

/// GET /sessions
pub async fn list_sessions(State(state): State<AppState>) -> Response {
    let sessions = state.registry.list_all().await;
    (StatusCode::OK, Json(json!({"sessions": sessions}))).into_response()
}

/// DELETE /sessions/{id}
///
/// Stops the provider handle first, then removes the record. Idempotent.
pub async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let session_id = SessionId(id);

    if let Some(record) = state.registry.get(&session_id).await {
        match state.providers.get(record.platform) {
            Ok(provider) => {
                if let Err(e) = provider.stop(&session_id).await {
                    warn!(session_id = %session_id, error = %e, "provider stop failed");
                }
            }
            Err(e) => warn!(session_id = %session_id, error = %e, "no provider to stop"),
        }
    }

    if let Err(e) = state.registry.delete(&session_id).await {
        warn!(session_id = %session_id, error = %e, "session delete failed");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e);
    }
    (StatusCode::OK, Json(json!({"ok": true}))).into_response()
}
