//! Session management: listing a user's devices, renaming one, revoking one.
//!
//! Every route here resolves the caller through the same auth facade as any
//! other protected route (which bumps the caller's own session), verifies
//! ownership of the target, then mutates. Revoking an already-absent
//! session succeeds idempotently.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use std::sync::Arc;
use validator::Validate;

use super::auth_header;
use super::super::error::ApiError;
use super::super::state::AppState;
use super::super::types::{SessionIdResponse, SessionListEntry, UpdateSessionRequest};
use crate::db::SessionRepo;

/// List all sessions of a user, flagging the caller's own.
///
/// GET /users/{id}/sessions
#[utoipa::path(
    get,
    path = "/users/{id}/sessions",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Sessions for the user", body = [SessionListEntry]),
        (status = 403, description = "Not the target user")
    ),
    tag = "Sessions"
)]
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<SessionListEntry>>, ApiError> {
    let current = state.auth.current_session(auth_header(&headers)).await?;
    if current.user != id {
        return Err(ApiError::Forbidden(
            "Cannot access sessions for other users",
        ));
    }

    let sessions = state.store.sessions_for_user(&id).await?;
    let entries = sessions
        .iter()
        .map(|session| SessionListEntry::new(session, &current.id))
        .collect();

    Ok(Json(entries))
}

/// Rename the device label of an owned session.
///
/// PATCH /sessions/{sid}
#[utoipa::path(
    patch,
    path = "/sessions/{sid}",
    params(("sid" = String, Path, description = "Session id")),
    request_body = UpdateSessionRequest,
    responses(
        (status = 200, description = "Updated session", body = SessionListEntry),
        (status = 403, description = "Session belongs to another user"),
        (status = 404, description = "No such session")
    ),
    tag = "Sessions"
)]
pub async fn patch_session(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateSessionRequest>,
) -> Result<Json<SessionListEntry>, ApiError> {
    req.validate()
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let current = state.auth.current_session(auth_header(&headers)).await?;

    let target = state
        .store
        .session_by_id(&sid)
        .await?
        .ok_or(ApiError::NotFound("Session cannot be found"))?;
    if target.user != current.user {
        return Err(ApiError::Forbidden(
            "Cannot edit sessions other than your own",
        ));
    }

    let updated = match req.device_name {
        Some(device) => state
            .store
            .rename_session_device(&sid, &device)
            .await?
            .ok_or(ApiError::NotFound("Session cannot be found"))?,
        None => target,
    };

    Ok(Json(SessionListEntry::new(&updated, &current.id)))
}

/// Revoke an owned session. Deleting an unknown session id succeeds.
///
/// DELETE /sessions/{sid}
#[utoipa::path(
    delete,
    path = "/sessions/{sid}",
    params(("sid" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session revoked (or already gone)", body = SessionIdResponse),
        (status = 403, description = "Session belongs to another user")
    ),
    tag = "Sessions"
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(sid): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SessionIdResponse>, ApiError> {
    let current = state.auth.current_session(auth_header(&headers)).await?;

    let Some(target) = state.store.session_by_id(&sid).await? else {
        // Already gone: revocation is idempotent.
        return Ok(Json(SessionIdResponse { id: sid }));
    };
    if target.user != current.user {
        return Err(ApiError::Forbidden(
            "Cannot delete sessions you do not own",
        ));
    }

    state.store.delete_session(&sid).await?;
    tracing::info!(session = %sid, user = %current.user, "session revoked");

    Ok(Json(SessionIdResponse { id: sid }))
}
