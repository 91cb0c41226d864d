//! Grace relay HTTP API
//!
//! Axum-based HTTP server that exposes the relay to browser and terminal clients,
//! which may be hosted on a different origin.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a pure
//! inner function. The inner functions are directly testable without axum dispatch
//! machinery.
//!
//! Endpoints:
//! - POST    /chat    — relay a transcript (path configurable)
//! - OPTIONS /chat    — CORS preflight, 200 with empty body
//! - GET     /health  — credential/provider status
//! - GET     /version — server version info

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use grace_core::{ChatReply, ChatRequest, ErrorBody, HttpConfig, RelayError};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::relay::RelayService;

/// Shared state for all HTTP handlers
pub struct HttpState {
    pub relay: RelayService,
}

/// Build the Axum router with all endpoints. `chat_path` is the relay route.
pub fn build_router(state: Arc<HttpState>, chat_path: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route(chat_path, post(chat_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    http: HttpConfig,
    relay: RelayService,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", http.host, http.port);
    let state = Arc::new(HttpState { relay });

    let app = build_router(state, &http.path);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Grace relay listening on http://{}{}", addr, http.path);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

/// HTTP status for each relay failure kind.
pub fn status_for(err: &RelayError) -> StatusCode {
    match err {
        RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
        RelayError::Configuration(_) => StatusCode::FAILED_DEPENDENCY,
        RelayError::Upstream(_) | RelayError::UpstreamProtocol(_) => StatusCode::BAD_GATEWAY,
    }
}

/// Inner chat — relays a parsed request, or reports why it could not be parsed.
pub async fn chat_inner(
    relay: &RelayService,
    request: std::result::Result<ChatRequest, RelayError>,
) -> (StatusCode, serde_json::Value) {
    let outcome = match request {
        Ok(req) => relay.relay(&req.messages).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(response) => (StatusCode::OK, serde_json::json!(ChatReply { response })),
        Err(e) => (status_for(&e), serde_json::json!(ErrorBody::new(e.kind()))),
    }
}

/// Inner health — reports whether chats can reach a provider (pure, no IO).
pub fn health_inner(relay: &RelayService) -> (StatusCode, serde_json::Value) {
    let status = if relay.is_configured() {
        "healthy"
    } else {
        "degraded"
    };

    (
        StatusCode::OK,
        serde_json::json!({
            "status": status,
            "version": env!("CARGO_PKG_VERSION"),
            "provider": relay.provider_name(),
            "credential_configured": relay.is_configured(),
        }),
    )
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "grace/1",
    })
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn chat_handler(
    State(state): State<Arc<HttpState>>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = payload.map(|Json(req)| req).map_err(|rejection| {
        // The rejection text can quote the body, so only its status is logged.
        tracing::debug!(status = %rejection.status(), "Rejected malformed chat request");
        RelayError::BadRequest(rejection.body_text())
    });
    let (status, body) = chat_inner(&state.relay, request).await;
    (status, Json(body))
}

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.relay);
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================
