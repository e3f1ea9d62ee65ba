//! Bookmark CRUD: thin glue between ownership checks and the bookmark repo.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use chrono::Utc;
use std::sync::Arc;

use super::auth_header;
use super::super::error::ApiError;
use super::super::state::AppState;
use super::super::types::{
    BookmarkBody, BookmarkDeleteResponse, BookmarkInput, BookmarkResponse,
};
use crate::db::{Bookmark, BookmarkRepo};

/// GET /users/{id}/bookmarks
#[utoipa::path(
    get,
    path = "/users/{id}/bookmarks",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "All bookmarks", body = [BookmarkResponse]),
        (status = 403, description = "Not the target user")
    ),
    tag = "Bookmarks"
)]
pub async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<BookmarkResponse>>, ApiError> {
    let session = state.auth.current_session(auth_header(&headers)).await?;
    if session.user != id {
        return Err(ApiError::Forbidden("Cannot access other user information"));
    }

    let bookmarks = state.store.bookmarks_for_user(&id).await?;
    Ok(Json(bookmarks.iter().map(BookmarkResponse::from).collect()))
}

/// Bulk upsert, used by clients to sync their whole bookmark list.
///
/// PUT /users/{id}/bookmarks
#[utoipa::path(
    put,
    path = "/users/{id}/bookmarks",
    params(("id" = String, Path, description = "User id")),
    request_body = [BookmarkInput],
    responses(
        (status = 200, description = "Upserted bookmarks", body = [BookmarkResponse]),
        (status = 403, description = "Not the target user")
    ),
    tag = "Bookmarks"
)]
pub async fn put_bookmarks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(items): Json<Vec<BookmarkInput>>,
) -> Result<Json<Vec<BookmarkResponse>>, ApiError> {
    let session = state.auth.current_session(auth_header(&headers)).await?;
    if session.user != id {
        return Err(ApiError::Forbidden("Cannot access other user information"));
    }

    let now = Utc::now();
    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let bookmark = Bookmark {
            tmdb_id: item.tmdb_id,
            user_id: id.clone(),
            meta: item.meta,
            group: item.group.map(|g| g.into_vec()).unwrap_or_default(),
            updated_at: now,
        };
        state.store.upsert_bookmark(&bookmark).await?;
        results.push(BookmarkResponse::from(&bookmark));
    }

    Ok(Json(results))
}

/// POST /users/{id}/bookmarks/{tmdb_id}
#[utoipa::path(
    post,
    path = "/users/{id}/bookmarks/{tmdb_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("tmdb_id" = String, Path, description = "TMDB id")
    ),
    request_body = BookmarkBody,
    responses(
        (status = 200, description = "Created bookmark", body = BookmarkResponse),
        (status = 400, description = "Already bookmarked"),
        (status = 403, description = "Not the target user")
    ),
    tag = "Bookmarks"
)]
pub async fn add_bookmark(
    State(state): State<Arc<AppState>>,
    Path((id, tmdb_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<BookmarkBody>,
) -> Result<Json<BookmarkResponse>, ApiError> {
    let session = state.auth.current_session(auth_header(&headers)).await?;
    if session.user != id {
        return Err(ApiError::Forbidden(
            "Cannot access bookmarks for other users",
        ));
    }

    if state.store.bookmark(&id, &tmdb_id).await?.is_some() {
        return Err(ApiError::BadRequest("Already bookmarked".into()));
    }

    let bookmark = Bookmark {
        tmdb_id,
        user_id: id,
        meta: body.meta,
        group: body.group.map(|g| g.into_vec()).unwrap_or_default(),
        updated_at: Utc::now(),
    };
    state.store.upsert_bookmark(&bookmark).await?;

    Ok(Json(BookmarkResponse::from(&bookmark)))
}

/// DELETE /users/{id}/bookmarks/{tmdb_id} — idempotent.
#[utoipa::path(
    delete,
    path = "/users/{id}/bookmarks/{tmdb_id}",
    params(
        ("id" = String, Path, description = "User id"),
        ("tmdb_id" = String, Path, description = "TMDB id")
    ),
    responses(
        (status = 200, description = "Bookmark removed (or was absent)", body = BookmarkDeleteResponse),
        (status = 403, description = "Not the target user")
    ),
    tag = "Bookmarks"
)]
pub async fn delete_bookmark(
    State(state): State<Arc<AppState>>,
    Path((id, tmdb_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<BookmarkDeleteResponse>, ApiError> {
    let session = state.auth.current_session(auth_header(&headers)).await?;
    if session.user != id {
        return Err(ApiError::Forbidden(
            "Cannot access bookmarks for other users",
        ));
    }

    // Missing rows are fine; the outcome is the same.
    state.store.delete_bookmark(&id, &tmdb_id).await?;

    Ok(Json(BookmarkDeleteResponse { tmdb_id }))
}
