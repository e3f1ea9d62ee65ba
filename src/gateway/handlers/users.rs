//! Current-user lookup and profile mutation.

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use std::sync::Arc;

use super::auth_header;
use super::super::error::ApiError;
use super::super::state::AppState;
use super::super::types::{
    EditProfileRequest, MeResponse, SessionResponse, UserDetailResponse, UserResponse,
};
use crate::db::UserRepo;

/// Who am I: the user and (bumped) session behind a bearer token.
///
/// GET /users/@me
#[utoipa::path(
    get,
    path = "/users/@me",
    responses(
        (status = 200, description = "Current user and session", body = MeResponse),
        (status = 401, description = "Missing or invalid credential"),
        (status = 404, description = "Session's user no longer exists")
    ),
    tag = "Users"
)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, ApiError> {
    let session = state.auth.current_session(auth_header(&headers)).await?;

    let user = state
        .store
        .user_by_id(&session.user)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(MeResponse {
        user: UserResponse::from(&user),
        session: SessionResponse::from(&session),
    }))
}

/// Replace a user's profile blob. Owner only.
///
/// PATCH /users/{id}
#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = EditProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = UserDetailResponse),
        (status = 403, description = "Not the target user")
    ),
    tag = "Users"
)]
pub async fn edit_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<EditProfileRequest>,
) -> Result<Json<UserDetailResponse>, ApiError> {
    let session = state.auth.current_session(auth_header(&headers)).await?;
    if session.user != id {
        return Err(ApiError::Forbidden("Cannot modify other users"));
    }

    let user = state
        .store
        .update_profile(&id, &req.profile)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    tracing::info!(user = %id, "profile updated");

    Ok(Json(UserDetailResponse::from(&user)))
}
