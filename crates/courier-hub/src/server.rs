// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP/WebSocket server built on axum.
//!
//! Sets up routes, CORS, and shared state for the transport layer.

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use courier_bus::AccountBus;
use courier_config::model::ServerConfig;
use courier_core::{CourierError, ProviderRegistry};
use courier_session::SessionRegistry;

use crate::hub::BroadcastHub;
use crate::routes;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<BroadcastHub>,
    pub bus: Arc<AccountBus>,
    pub registry: Arc<SessionRegistry>,
    pub providers: Arc<ProviderRegistry>,
}

/// Build the transport router over the shared state.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = if config.allowed_origins.is_empty()
        || config.allowed_origins.iter().any(|o| o == "*")
    {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    };

    Router::new()
        .route("/health", get(routes::get_health))
        .route("/wa/sessions/create", post(routes::create_wa_session))
        .route("/wa/sessions/connected", get(routes::get_connected_wa_sessions))
        .route("/wa/login/qr", get(routes::get_wa_login_qr))
        .route("/wa/login/status", get(routes::get_wa_login_status))
        .route("/sessions", get(routes::list_sessions))
        .route("/sessions/{id}", delete(routes::delete_session))
        .route("/ws", get(ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until the cancellation token fires.
pub async fn start_server(
    config: &ServerConfig,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), CourierError> {
    let app = build_router(state, config);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CourierError::Hub {
            message: format!("failed to bind transport to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    info!("transport listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| CourierError::Hub {
            message: format!("transport server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use courier_core::{Platform, QrSnapshot, SessionId};
    use courier_test_utils::{MemoryAccountStore, MockProvider};

    struct Rig {
        state: AppState,
        provider: Arc<MockProvider>,
    }

    fn make_rig() -> Rig {
        let provider = Arc::new(MockProvider::new(Platform::Whatsapp));
        let mut providers = ProviderRegistry::new();
        providers.register(provider.clone());
        let state = AppState {
            hub: Arc::new(BroadcastHub::new()),
            bus: Arc::new(AccountBus::new(16)),
            registry: Arc::new(SessionRegistry::new(Arc::new(MemoryAccountStore::new()))),
            providers: Arc::new(providers),
        };
        Rig { state, provider }
    }

    fn router(rig: &Rig) -> Router {
        build_router(rig.state.clone(), &ServerConfig::default())
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 100_000).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let rig = make_rig();
        let resp = router(&rig)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert!(body["version"].is_string());
    }

    #[tokio::test]
    async fn create_session_returns_id_and_starts_login() {
        let rig = make_rig();
        let resp = router(&rig)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/wa/sessions/create")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let session_id = body["sessionId"].as_str().unwrap().to_string();

        assert!(rig.state.registry.get(&SessionId(session_id.clone())).await.is_some());
        assert!(rig.provider.listening().await.contains(&session_id));
    }

    #[tokio::test]
    async fn qr_without_session_id_is_bad_request() {
        let rig = make_rig();
        let resp = router(&rig)
            .oneshot(Request::builder().uri("/wa/login/qr").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["code"], "MISSING_SESSION_ID");
    }

    #[tokio::test]
    async fn qr_pending_then_ready() {
        let rig = make_rig();

        let resp = router(&rig)
            .oneshot(
                Request::builder()
                    .uri("/wa/login/qr?sessionId=wa-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(resp.headers()["X-QR-Status"], "pending");
        let body = body_json(resp).await;
        assert_eq!(body["pending"], true);

        rig.provider.set_qr(
            "wa-1",
            Some(QrSnapshot {
                data_url: "data:image/svg+xml;base64,Zm9v".into(),
                expires_in: Duration::from_secs(42),
            }),
        );

        let resp = router(&rig)
            .oneshot(
                Request::builder()
                    .uri("/wa/login/qr?sessionId=wa-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["X-QR-Status"], "ready");
        assert_eq!(resp.headers()["X-QR-Expires-In"], "42");
        let body = body_json(resp).await;
        assert_eq!(body["dataUrl"], "data:image/svg+xml;base64,Zm9v");
    }

    #[tokio::test]
    async fn login_status_tracks_registry() {
        let rig = make_rig();
        let id = rig.state.registry.create(Platform::Whatsapp).await.unwrap();

        let resp = router(&rig)
            .oneshot(
                Request::builder()
                    .uri(format!("/wa/login/status?sessionId={id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["ok"], true);
        assert_eq!(body["status"], "INIT");
    }

    #[tokio::test]
    async fn login_status_unknown_session_is_not_found() {
        let rig = make_rig();
        let resp = router(&rig)
            .oneshot(
                Request::builder()
                    .uri("/wa/login/status?sessionId=ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_session_stops_provider_and_removes_record() {
        let rig = make_rig();
        let id = rig.state.registry.create(Platform::Whatsapp).await.unwrap();

        let resp = router(&rig)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/sessions/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(rig.state.registry.get(&id).await.is_none());
        assert!(rig.provider.stopped().await.contains(&id.0));
    }

    #[tokio::test]
    async fn delete_unknown_session_is_ok() {
        let rig = make_rig();
        let resp = router(&rig)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/sessions/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn connected_sessions_lists_whatsapp_only() {
        let rig = make_rig();
        rig.state.registry.create(Platform::Whatsapp).await.unwrap();
        rig.state.registry.create(Platform::Telegram).await.unwrap();

        let resp = router(&rig)
            .oneshot(
                Request::builder()
                    .uri("/wa/sessions/connected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["sessions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let rig = make_rig();
        let resp = router(&rig)
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
