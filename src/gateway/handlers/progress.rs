//! Watch-progress CRUD and bulk import.
//!
//! Movie rows claim the sentinel season/episode slot (see
//! [`crate::db::MOVIE_SLOT`]) so the per-user uniqueness key holds; episode
//! rows use the real ids. Client-supplied timestamps are clamped into
//! [service epoch, now] so imports cannot plant rows in the future or the
//! distant past.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::auth_header;
use super::super::error::ApiError;
use super::super::state::AppState;
use super::super::types::{
    ProgressDeleteRequest, ProgressDeleteResponse, ProgressImportItem, ProgressResponse,
    ProgressUpdateRequest,
};
use crate::db::{MOVIE_SLOT, ProgressItem, ProgressMediaType, ProgressRepo};

/// Service epoch: no progress timestamp may predate it.
const MIN_EPOCH_MS: i64 = 1_626_134_400_000;

fn min_epoch() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(MIN_EPOCH_MS).expect("valid timestamp")
}

/// Parse an optional RFC 3339 timestamp, defaulting to now and clamping
/// into [service epoch, now].
fn clamp_updated_at(value: Option<&str>) -> DateTime<Utc> {
    let now = Utc::now();
    let parsed = value
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);

    parsed.clamp(min_epoch(), now)
}

fn owner_check(session_user: &str, target: &str) -> Result<(), ApiError> {
    if session_user != target {
        return Err(ApiError::Forbidden("Cannot modify user other than yourself"));
    }
    Ok(())
}

/// GET /users/{id}/progress
#[utoipa::path(
    get,
    path = "/users/{id}/progress",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "All progress items", body = [ProgressResponse]),
        (status = 403, description = "Not the target user")
    ),
    tag = "Progress"
)]
pub async fn list_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<ProgressResponse>>, ApiError> {
    let session = state.auth.current_session(auth_header(&headers)).await?;
    owner_check(&session.user, &id)?;

    let items = state.store.progress_for_user(&id).await?;
    Ok(Json(items.iter().map(ProgressResponse::from).collect()))
}

/// Upsert the watch position for one title (or one of its episodes).
///
/// PUT /users/{id}/progress/{tmdb_id}
#[utoipa::path(
    put,
    path = "/users/{id}/progress/{tmdb_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("tmdb_id" = String, Path, description = "TMDB id")
    ),
    request_body = ProgressUpdateRequest,
    responses(
        (status = 200, description = "Stored progress", body = ProgressResponse),
        (status = 403, description = "Not the target user")
    ),
    tag = "Progress"
)]
pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    Path((id, tmdb_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(req): Json<ProgressUpdateRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let session = state.auth.current_session(auth_header(&headers)).await?;
    owner_check(&session.user, &id)?;

    let is_movie = req.meta.kind == ProgressMediaType::Movie;
    let season_slot = if is_movie {
        Some(MOVIE_SLOT.to_string())
    } else {
        req.season_id.clone()
    };
    let episode_slot = if is_movie {
        Some(MOVIE_SLOT.to_string())
    } else {
        req.episode_id.clone()
    };

    let existing = state
        .store
        .progress_by_slot(&id, &tmdb_id, season_slot.as_deref(), episode_slot.as_deref())
        .await?;

    let updated_at = clamp_updated_at(req.updated_at.as_deref());
    let duration = req.duration.round() as i64;
    let watched = req.watched.round() as i64;

    let item = match existing {
        // Keep the row identity and slots; only the position moves.
        Some(mut item) => {
            item.duration = duration;
            item.watched = watched;
            item.meta = req.meta;
            item.updated_at = updated_at;
            item
        }
        None => ProgressItem {
            id: Uuid::new_v4().to_string(),
            tmdb_id,
            user_id: id,
            season_id: season_slot,
            episode_id: episode_slot,
            season_number: req.season_number,
            episode_number: req.episode_number,
            duration,
            watched,
            meta: req.meta,
            updated_at,
        },
    };

    state.store.upsert_progress(&item).await?;
    Ok(Json(ProgressResponse::from(&item)))
}

/// Clear progress for a title, optionally narrowed by season/episode.
///
/// DELETE /users/{id}/progress/{tmdb_id}
#[utoipa::path(
    delete,
    path = "/users/{id}/progress/{tmdb_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("tmdb_id" = String, Path, description = "TMDB id")
    ),
    request_body = ProgressDeleteRequest,
    responses(
        (status = 200, description = "Rows removed", body = ProgressDeleteResponse),
        (status = 403, description = "Not the target user")
    ),
    tag = "Progress"
)]
pub async fn delete_progress(
    State(state): State<Arc<AppState>>,
    Path((id, tmdb_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Option<Json<ProgressDeleteRequest>>,
) -> Result<Json<ProgressDeleteResponse>, ApiError> {
    let session = state.auth.current_session(auth_header(&headers)).await?;
    owner_check(&session.user, &id)?;

    let req = body.map(|Json(req)| req).unwrap_or_default();
    let is_movie = req
        .meta
        .as_ref()
        .is_some_and(|meta| meta.kind == ProgressMediaType::Movie);

    let season_filter = req
        .season_id
        .clone()
        .or_else(|| is_movie.then(|| MOVIE_SLOT.to_string()));
    let episode_filter = req
        .episode_id
        .clone()
        .or_else(|| is_movie.then(|| MOVIE_SLOT.to_string()));

    let count = state
        .store
        .delete_progress(
            &id,
            &tmdb_id,
            season_filter.as_deref(),
            episode_filter.as_deref(),
        )
        .await?;

    Ok(Json(ProgressDeleteResponse {
        count,
        tmdb_id,
        episode_id: req.episode_id,
        season_id: req.season_id,
    }))
}

/// Merge a full progress export into the account.
///
/// An imported entry only overwrites an existing row when it has strictly
/// more watched time; unmatched entries become new rows.
///
/// PUT /users/{id}/progress/import
#[utoipa::path(
    put,
    path = "/users/{id}/progress/import",
    params(("id" = String, Path, description = "User id")),
    request_body = [ProgressImportItem],
    responses(
        (status = 200, description = "Rows written by the merge", body = [ProgressResponse]),
        (status = 403, description = "Not the target user")
    ),
    tag = "Progress"
)]
pub async fn import_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(items): Json<Vec<ProgressImportItem>>,
) -> Result<Json<Vec<ProgressResponse>>, ApiError> {
    let session = state.auth.current_session(auth_header(&headers)).await?;
    owner_check(&session.user, &id)?;

    let existing = state.store.progress_for_user(&id).await?;

    let mut incoming = items;
    let mut to_upsert: Vec<ProgressItem> = Vec::new();

    for current in &existing {
        let matched = incoming.iter().position(|item| {
            item.tmdb_id == current.tmdb_id
                && item.season_id == current.season_id
                && item.episode_id == current.episode_id
        });
        let Some(index) = matched else { continue };
        let item = incoming.swap_remove(index);

        let watched = item.watched.round() as i64;
        if current.watched < watched {
            let mut updated = current.clone();
            updated.duration = item.duration.round() as i64;
            updated.watched = watched;
            updated.meta = item.meta;
            updated.updated_at = clamp_updated_at(item.updated_at.as_deref());
            to_upsert.push(updated);
        }
    }

    for item in incoming {
        to_upsert.push(ProgressItem {
            id: Uuid::new_v4().to_string(),
            tmdb_id: item.tmdb_id,
            user_id: id.clone(),
            season_id: item.season_id,
            episode_id: item.episode_id,
            season_number: item.season_number,
            episode_number: item.episode_number,
            duration: item.duration.round() as i64,
            watched: item.watched.round() as i64,
            meta: item.meta,
            updated_at: clamp_updated_at(item.updated_at.as_deref()),
        });
    }

    for item in &to_upsert {
        state.store.upsert_progress(item).await?;
    }

    tracing::info!(user = %id, rows = to_upsert.len(), "progress import merged");

    Ok(Json(to_upsert.iter().map(ProgressResponse::from).collect()))
}
