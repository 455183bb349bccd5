use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::core::domain::{ActionCode, ActionRequest, ActionResult};
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/ws", get(ws_handler))
        .route("/healthz", get(health_handler))
        .route("/api/data", get(data_handler))
        .route("/api/restart", post(restart_handler))
        .nest_service("/ui", ServeDir::new("src/ui"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index_handler() -> impl IntoResponse {
    match std::fs::read_to_string("src/ui/index.html") {
        Ok(html) => Html(html),
        Err(_) => Html("<h1>Error: UI not found</h1>".to_string()),
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.tx.subscribe();

    loop {
        tokio::select! {
            broadcast = rx.recv() => match broadcast {
                Ok(msg) => {
                    if sender.send(Message::Text(msg)).await.is_err() {
                        break;
                    }
                }
                // Geride kalan aboneye eski mesajları kovalamak gerekmez.
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(_) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
}

async fn data_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.current() {
        Some(snapshot) => (StatusCode::OK, Json(serde_json::json!(&*snapshot))).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "state": "pending",
                "detail": "ilk anlık görüntü henüz yayınlanmadı"
            })),
        )
            .into_response(),
    }
}

async fn restart_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ActionRequest>,
) -> impl IntoResponse {
    let result = state.dispatcher.dispatch(&req).await;
    (status_for(&result), Json(result)).into_response()
}

fn status_for(result: &ActionResult) -> StatusCode {
    if result.ok {
        return StatusCode::OK;
    }
    match result.code {
        Some(ActionCode::ValidationError) | Some(ActionCode::UnsupportedType) => StatusCode::BAD_REQUEST,
        Some(ActionCode::NotFound) => StatusCode::NOT_FOUND,
        Some(ActionCode::Timeout) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::kubectl::KubectlClient;
    use crate::config::AppConfig;
    use crate::core::dispatch::ActionDispatcher;
    use crate::core::domain::{ClusterSnapshot, ResourceKind, ResourceSnapshot};
    use crate::core::store::ClusterStateStore;
    use axum::body::to_bytes;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use tokio::sync::broadcast;

    fn test_state() -> Arc<AppState> {
        let kubectl = KubectlClient::new("kubectl", 1, 1);
        let (tx, _) = broadcast::channel(8);
        Arc::new(AppState {
            config: AppConfig {
                env: "test".into(),
                node_name: "TEST".into(),
                host: "127.0.0.1".into(),
                http_port: 0,
                kubectl_bin: "kubectl".into(),
                poll_interval: 1,
                query_timeout: 1,
                action_timeout: 1,
            },
            kubectl: kubectl.clone(),
            store: ClusterStateStore::new(),
            dispatcher: ActionDispatcher::new(kubectl),
            tx,
        })
    }

    #[tokio::test]
    async fn data_endpoint_reports_pending_until_first_publish() {
        let state = test_state();

        let response = data_handler(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["state"], "pending");

        let mut resources = BTreeMap::new();
        for kind in ResourceKind::ALL {
            resources.insert(kind, ResourceSnapshot::ready(kind, vec![]));
        }
        state
            .store
            .publish(ClusterSnapshot { resources, observed_at: Utc::now() });

        let response = data_handler(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["resources"]["pods"]["state"], "ready");
        assert!(v["observed_at"].is_string());
    }

    #[test]
    fn status_codes_follow_action_codes() {
        assert_eq!(status_for(&ActionResult::success("ok")), StatusCode::OK);
        assert_eq!(
            status_for(&ActionResult::failure(ActionCode::ValidationError, "x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ActionResult::failure(ActionCode::UnsupportedType, "x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&ActionResult::failure(ActionCode::NotFound, "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&ActionResult::failure(ActionCode::Timeout, "x")),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&ActionResult::failure(ActionCode::CommandFailed, "x")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&ActionResult::failure(ActionCode::ParseError, "x")),
            StatusCode::BAD_GATEWAY
        );
    }
}
