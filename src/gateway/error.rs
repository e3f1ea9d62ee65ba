//! Error taxonomy surfaced by route handlers.
//!
//! Every failure is a tagged kind with a fixed HTTP status; nothing
//! downstream matches on message strings. Challenge and token failures are
//! normalized before they get here so the response never reveals which
//! verification step rejected a request.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input: schema/validation failures.
    #[error("{0}")]
    BadRequest(String),

    /// Missing/invalid/expired credential, unknown user at login, or any
    /// challenge failure.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Authenticated, but not the owner of the target resource.
    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    /// Duplicate public key at registration.
    #[error("{0}")]
    Conflict(&'static str),

    #[error("internal server error")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body for error responses.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(source) = &self {
            tracing::error!("request failed: {source:#}");
        }
        let body = ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            // The unique index on public keys is the only conflict source.
            StoreError::Conflict => {
                ApiError::Conflict("A user with this public key already exists")
            }
            other => ApiError::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized => ApiError::Unauthorized("Unauthorized"),
            AuthError::MissingUserAgent => ApiError::BadRequest("No user agent provided".into()),
            // One terse message for every challenge failure: unknown,
            // mis-scoped, expired, and bad-signature are indistinguishable.
            AuthError::Challenge(_) => ApiError::Unauthorized("Invalid challenge code"),
            AuthError::TokenEncoding(source) => ApiError::Internal(anyhow::Error::new(source)),
            AuthError::Store(source) => ApiError::from(source),
        }
    }
}
