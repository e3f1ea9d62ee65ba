//! Device-bound sessions with sliding expiration.
//!
//! A session is minted after a successful challenge flow and lives for 21
//! days from its most recent use: every successful resolution bumps
//! `accessed_at` and pushes `expires_at` forward. An expired session is
//! indistinguishable from a missing one on every read path.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use super::error::AuthError;
use crate::db::{Session, SessionRepo, Store};

/// Sliding expiry window, measured from the latest access.
pub const SESSION_TTL_DAYS: i64 = 21;

/// Creates, resolves, and bumps session records.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn Store>,
}

impl SessionService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Fetch a session without touching it. Expired reads as absent.
    pub async fn get_session(&self, id: &str) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.store.session_by_id(id).await? else {
            return Ok(None);
        };
        if session.expires_at < Utc::now() {
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Fetch a session and slide its expiry forward.
    ///
    /// The underlying update is conditional on the record still being
    /// unexpired, so the validity check and the bump cannot race: a session
    /// that lapses between two requests stays lapsed.
    pub async fn get_session_and_bump(&self, id: &str) -> Result<Option<Session>, AuthError> {
        let now = Utc::now();
        let session = self
            .store
            .bump_session(id, now, now + Duration::days(SESSION_TTL_DAYS))
            .await?;
        Ok(session)
    }

    /// Mint a session for `user` on the described device.
    ///
    /// The user agent doubles as a device-fingerprinting signal and is
    /// required; an absent or empty one fails with `MissingUserAgent`.
    pub async fn make_session(
        &self,
        user: &str,
        device: &str,
        user_agent: Option<&str>,
    ) -> Result<Session, AuthError> {
        let user_agent = match user_agent {
            Some(ua) if !ua.is_empty() => ua,
            _ => return Err(AuthError::MissingUserAgent),
        };

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user: user.to_string(),
            device: device.to_string(),
            user_agent: user_agent.to_string(),
            created_at: now,
            accessed_at: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        };
        self.store.insert_session(&session).await?;
        Ok(session)
    }
}
