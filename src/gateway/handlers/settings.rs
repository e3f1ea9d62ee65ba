//! Per-user application settings.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use std::sync::Arc;

use super::auth_header;
use super::super::error::ApiError;
use super::super::state::AppState;
use super::super::types::{SettingsData, SettingsEnvelope, SettingsRequest};
use crate::db::{SettingsRepo, UserSettings};

/// GET /users/{id}/settings — an absent row reads as all-null settings.
#[utoipa::path(
    get,
    path = "/users/{id}/settings",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Current settings", body = SettingsEnvelope),
        (status = 403, description = "Not the target user")
    ),
    tag = "Settings"
)]
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SettingsEnvelope>, ApiError> {
    let session = state.auth.current_session(auth_header(&headers)).await?;
    if session.user != id {
        return Err(ApiError::Forbidden("Permission denied"));
    }

    let settings = state
        .store
        .settings_for_user(&id)
        .await?
        .unwrap_or_default();

    Ok(Json(SettingsEnvelope {
        settings: SettingsData::from(&settings),
    }))
}

/// PUT /users/{id}/settings — merge: only fields present in the body change.
#[utoipa::path(
    put,
    path = "/users/{id}/settings",
    params(("id" = String, Path, description = "User id")),
    request_body = SettingsRequest,
    responses(
        (status = 200, description = "Updated settings", body = SettingsEnvelope),
        (status = 403, description = "Not the target user")
    ),
    tag = "Settings"
)]
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<SettingsEnvelope>, ApiError> {
    let session = state.auth.current_session(auth_header(&headers)).await?;
    if session.user != id {
        return Err(ApiError::Forbidden("Permission denied"));
    }

    let mut settings = state
        .store
        .settings_for_user(&id)
        .await?
        .unwrap_or(UserSettings {
            user_id: id.clone(),
            ..UserSettings::default()
        });

    if req.application_theme.is_some() {
        settings.application_theme = req.application_theme;
    }
    if req.application_language.is_some() {
        settings.application_language = req.application_language;
    }
    if req.default_subtitle_language.is_some() {
        settings.default_subtitle_language = req.default_subtitle_language;
    }
    if req.proxy_urls.is_some() {
        settings.proxy_urls = req.proxy_urls;
    }
    if req.trakt_key.is_some() {
        settings.trakt_key = req.trakt_key;
    }
    if req.febbox_key.is_some() {
        settings.febbox_key = req.febbox_key;
    }

    state.store.upsert_settings(&settings).await?;

    Ok(Json(SettingsEnvelope {
        settings: SettingsData::from(&settings),
    }))
}
