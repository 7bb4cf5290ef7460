//! Axum-based HTTP gateway for the voice platform.
//!
//! - `POST /skill`: Alexa request envelope in, response envelope out
//! - `GET /health`: liveness, no remote calls
//! - Request body size limit (64KB) and request timeout

use crate::config::Config;
use crate::shadow::{HttpShadowClient, ShadowClient};
use crate::skill::{IntentRouter, RequestEnvelope, ResponseEnvelope, REQUEST_DEADLINE};
use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Maximum request body size (64KB). Skill envelopes are a few KB at most
pub const MAX_BODY_SIZE: usize = 65_536;
/// Request timeout (30s). The router gives up earlier and still answers.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

const _: () = assert!(REQUEST_DEADLINE.as_secs() < REQUEST_TIMEOUT_SECS);

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<IntentRouter>,
}

/// Build the axum app around an intent router.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/skill", post(handle_skill))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
}

/// Run the HTTP gateway.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_port = listener.local_addr()?.port();

    let client: Arc<dyn ShadowClient> = Arc::new(HttpShadowClient::new(&config.shadow)?);
    let router = IntentRouter::from_config(client, &config.heartbeat);
    tracing::info!(
        wait = ?router.convergence_wait(),
        "Skill gateway listening on http://{host}:{actual_port}"
    );

    let app = build_app(AppState {
        router: Arc::new(router),
    });
    axum::serve(listener, app).await?;

    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// AXUM HANDLERS
// ══════════════════════════════════════════════════════════════════════════════

/// GET /health: always public
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /skill: one voice request, one spoken response
async fn handle_skill(
    State(state): State<AppState>,
    body: Result<Json<RequestEnvelope>, JsonRejection>,
) -> Response {
    let Json(envelope) = match body {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!("Skill request JSON parse error: {e}");
            let err = serde_json::json!({
                "error": "Invalid JSON body. Expected a skill request envelope: {\"request\": {\"type\": \"...\"}}"
            });
            return (StatusCode::BAD_REQUEST, Json(err)).into_response();
        }
    };

    let request_id = envelope.request_id().unwrap_or("unknown").to_string();
    let request = envelope.into_intent_request();
    tracing::debug!(request_id, kind = ?request.kind, "Skill request received");

    let response = state.router.handle(&request).await;
    (StatusCode::OK, Json(ResponseEnvelope::from(&response))).into_response()
}
