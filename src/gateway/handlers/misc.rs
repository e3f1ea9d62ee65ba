//! Root, health, and server-meta endpoints used by clients to bootstrap.

use axum::{Json, extract::State};
use std::sync::Arc;

use super::super::state::AppState;
use super::super::types::{HealthResponse, MessageResponse, MetaResponse};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GET /
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Backend reachable", body = MessageResponse)),
    tag = "System"
)]
pub async fn index() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: format!("Backend is working as expected (v{VERSION})"),
    })
}

/// GET /healthz
#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Service healthy", body = HealthResponse)),
    tag = "System"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: VERSION,
    })
}

/// GET /meta — name, version, and captcha requirements for clients.
#[utoipa::path(
    get,
    path = "/meta",
    responses((status = 200, description = "Server self-description", body = MetaResponse)),
    tag = "System"
)]
pub async fn meta(State(state): State<Arc<AppState>>) -> Json<MetaResponse> {
    Json(MetaResponse {
        name: state.meta.name.clone(),
        description: state.meta.description.clone(),
        version: VERSION,
        has_captcha: state.captcha_config.enabled,
        captcha_client_key: state.captcha_config.client_key.clone(),
    })
}
