//! Route handlers, grouped by API area.

pub mod auth;
pub mod bookmarks;
pub mod misc;
pub mod player;
pub mod progress;
pub mod sessions;
pub mod settings;
pub mod users;

use axum::http::{HeaderMap, header};

/// Extract the Authorization header value for the auth facade.
pub fn auth_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}
