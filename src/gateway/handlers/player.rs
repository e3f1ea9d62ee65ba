//! Watch-party player-status relay endpoints.
//!
//! Unauthenticated by design: room codes are the capability. Status data is
//! ephemeral (one minute) and never touches the persistence layer.

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::super::error::ApiError;
use super::super::state::AppState;
use super::super::types::{
    PlayerStatusAck, PlayerStatusQuery, PlayerStatusRequest, RoomStatusesResponse,
    UserStatusesResponse,
};
use crate::player::PlayerStatus;

/// Publish a status snapshot for a user in a room.
///
/// POST /player/status
#[utoipa::path(
    post,
    path = "/player/status",
    request_body = PlayerStatusRequest,
    responses(
        (status = 200, description = "Snapshot stored", body = PlayerStatusAck),
        (status = 400, description = "Missing userId or roomCode")
    ),
    tag = "Player"
)]
pub async fn post_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayerStatusRequest>,
) -> Result<Json<PlayerStatusAck>, ApiError> {
    let (Some(user_id), Some(room_code)) = (req.user_id, req.room_code) else {
        return Err(ApiError::BadRequest(
            "Missing required fields: userId, roomCode".into(),
        ));
    };
    if user_id.is_empty() || room_code.is_empty() {
        return Err(ApiError::BadRequest(
            "Missing required fields: userId, roomCode".into(),
        ));
    }

    let mut content = req.content.unwrap_or_default();
    if content.title.is_empty() {
        content.title = "Unknown".to_string();
    }
    if content.kind.is_empty() {
        content.kind = "Unknown".to_string();
    }

    let status = PlayerStatus {
        user_id,
        room_code,
        is_host: req.is_host,
        content,
        player: req.player.unwrap_or_default(),
        timestamp: 0, // assigned by the hub
    };

    let timestamp = state.player.push(status);

    Ok(Json(PlayerStatusAck {
        success: true,
        timestamp,
    }))
}

/// Poll statuses: per user in a room, or grouped for a whole room.
///
/// GET /player/status
#[utoipa::path(
    get,
    path = "/player/status",
    params(PlayerStatusQuery),
    responses(
        (status = 200, description = "Recent snapshots (shape depends on query)"),
        (status = 400, description = "Missing query parameters")
    ),
    tag = "Player"
)]
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PlayerStatusQuery>,
) -> Result<Response, ApiError> {
    match (query.user_id, query.room_code) {
        // Whole-room view, grouped by user.
        (None, Some(room_code)) => {
            let users = state.player.room_snapshot(&room_code);
            Ok(Json(RoomStatusesResponse { room_code, users }).into_response())
        }
        (Some(user_id), Some(room_code)) => {
            let statuses = state.player.statuses_for(&user_id, &room_code);
            Ok(Json(UserStatusesResponse {
                user_id,
                room_code,
                statuses,
            })
            .into_response())
        }
        _ => Err(ApiError::BadRequest(
            "Missing required query parameters: roomCode and/or userId".into(),
        )),
    }
}
