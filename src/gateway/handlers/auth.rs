//! Registration and login flow orchestration.
//!
//! Both flows are two-step: the start endpoint issues a challenge code, the
//! complete endpoint verifies the client's signature over it, consumes it,
//! and mints a session plus bearer token. A challenge moves through exactly
//! one of two terminal states: completed (consumed here) or abandoned
//! (expires untouched).

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::super::error::ApiError;
use super::super::state::AppState;
use super::super::types::{
    AuthCompleteResponse, ChallengeResponse, DeriveKeyRequest, DeriveKeyResponse,
    LoginCompleteRequest, LoginStartRequest, RegisterCompleteRequest, RegisterStartRequest,
    SessionResponse, UserResponse,
};
use crate::auth::{Flow, MNEMONIC_AUTH_TYPE, derive};
use crate::db::{User, UserRepo};

fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
}

/// Start registration: issue a challenge for the client to sign.
///
/// POST /auth/register/start
#[utoipa::path(
    post,
    path = "/auth/register/start",
    request_body = RegisterStartRequest,
    responses(
        (status = 200, description = "Challenge issued", body = ChallengeResponse),
        (status = 400, description = "Captcha required or rejected")
    ),
    tag = "Auth"
)]
pub async fn register_start(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterStartRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    if let Some(captcha) = &state.captcha {
        let token = req
            .captcha_token
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("Captcha token is required".into()))?;
        if !captcha.verify(token).await {
            return Err(ApiError::BadRequest("Captcha verification failed".into()));
        }
    }

    let challenge = state
        .challenges
        .create_challenge_code(Flow::Registration, MNEMONIC_AUTH_TYPE)
        .await?;

    Ok(Json(ChallengeResponse {
        challenge: challenge.code,
    }))
}

/// Complete registration: verify the signed challenge, create the user,
/// and hand back a session + token.
///
/// POST /auth/register/complete
#[utoipa::path(
    post,
    path = "/auth/register/complete",
    request_body = RegisterCompleteRequest,
    responses(
        (status = 200, description = "User created and logged in", body = AuthCompleteResponse),
        (status = 401, description = "Challenge verification failed"),
        (status = 409, description = "Public key already registered")
    ),
    tag = "Auth"
)]
pub async fn register_complete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<RegisterCompleteRequest>,
) -> Result<Json<AuthCompleteResponse>, ApiError> {
    req.validate()
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    state
        .challenges
        .verify_challenge_code(
            &req.challenge.code,
            &req.public_key,
            &req.challenge.signature,
            Flow::Registration,
            MNEMONIC_AUTH_TYPE,
        )
        .await?;

    // Fast path only: the unique index on public_key is the real arbiter
    // when two registrations race.
    if state
        .store
        .user_by_public_key(&req.public_key)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "A user with this public key already exists",
        ));
    }

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        namespace: req.namespace,
        public_key: req.public_key,
        profile: req.profile,
        permissions: vec![],
        created_at: now,
        last_logged_in: now,
    };
    state.store.create_user(&user).await?;

    let session = state
        .sessions
        .make_session(&user.id, &req.device, user_agent(&headers))
        .await?;
    let token = state.codec.encode(&session)?;

    tracing::info!(user = %user.id, "registered new user");

    Ok(Json(AuthCompleteResponse {
        user: UserResponse::from(&user),
        session: SessionResponse::from(&session),
        token,
    }))
}

/// Start login: check the public key is known, then issue a challenge.
///
/// POST /auth/login/start
#[utoipa::path(
    post,
    path = "/auth/login/start",
    request_body = LoginStartRequest,
    responses(
        (status = 200, description = "Challenge issued", body = ChallengeResponse),
        (status = 401, description = "Unknown public key")
    ),
    tag = "Auth"
)]
pub async fn login_start(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginStartRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    if state
        .store
        .user_by_public_key(&req.public_key)
        .await?
        .is_none()
    {
        return Err(ApiError::Unauthorized("User cannot be found"));
    }

    let challenge = state
        .challenges
        .create_challenge_code(Flow::Login, MNEMONIC_AUTH_TYPE)
        .await?;

    Ok(Json(ChallengeResponse {
        challenge: challenge.code,
    }))
}

/// Complete login: verify the signed challenge and mint a session + token.
///
/// POST /auth/login/complete
#[utoipa::path(
    post,
    path = "/auth/login/complete",
    request_body = LoginCompleteRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthCompleteResponse),
        (status = 401, description = "Challenge verification failed or unknown user")
    ),
    tag = "Auth"
)]
pub async fn login_complete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginCompleteRequest>,
) -> Result<Json<AuthCompleteResponse>, ApiError> {
    req.validate()
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    state
        .challenges
        .verify_challenge_code(
            &req.challenge.code,
            &req.public_key,
            &req.challenge.signature,
            Flow::Login,
            MNEMONIC_AUTH_TYPE,
        )
        .await?;

    // Re-fetch after the challenge check: the account may have vanished
    // between start and complete.
    let user = state
        .store
        .user_by_public_key(&req.public_key)
        .await?
        .ok_or(ApiError::Unauthorized("User cannot be found"))?;

    state.store.touch_last_login(&user.id, Utc::now()).await?;

    let session = state
        .sessions
        .make_session(&user.id, &req.device, user_agent(&headers))
        .await?;
    let token = state.codec.encode(&session)?;

    tracing::info!(user = %user.id, "user logged in");

    Ok(Json(AuthCompleteResponse {
        user: UserResponse::from(&user),
        session: SessionResponse::from(&session),
        token,
    }))
}

/// Derive the public key a mnemonic phrase maps to.
///
/// POST /auth/derive-public-key
#[utoipa::path(
    post,
    path = "/auth/derive-public-key",
    request_body = DeriveKeyRequest,
    responses(
        (status = 200, description = "Derived public key", body = DeriveKeyResponse),
        (status = 400, description = "Invalid request body")
    ),
    tag = "Auth"
)]
pub async fn derive_public_key(
    Json(req): Json<DeriveKeyRequest>,
) -> Result<Json<DeriveKeyResponse>, ApiError> {
    req.validate()
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;

    Ok(Json(DeriveKeyResponse {
        public_key: derive::public_key_for_mnemonic(&req.mnemonic),
    }))
}
