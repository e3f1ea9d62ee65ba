//! Repository trait definitions: the storage seam of the auth core.
//!
//! Route handlers and auth services only ever see these traits, so the same
//! code runs against PostgreSQL in production and the in-memory store in
//! tests and dev mode. Single-row conditional operations (challenge
//! consumption, session bump) are the atomicity boundary the concurrency
//! model relies on; implementations must keep them atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::{
    Bookmark, ChallengeCode, ProgressItem, Session, User, UserProfile, UserSettings,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. For users this is the
    /// authoritative duplicate-public-key signal, stronger than any
    /// application-level existence check.
    #[error("record already exists")]
    Conflict,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("corrupt stored record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a new user. Fails with [`StoreError::Conflict`] when the
    /// public key is already registered.
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn user_by_public_key(&self, public_key: &str) -> Result<Option<User>, StoreError>;

    async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Replace the profile blob; returns the updated user, or `None` when
    /// the user does not exist.
    async fn update_profile(
        &self,
        id: &str,
        profile: &UserProfile,
    ) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait SessionRepo: Send + Sync {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError>;

    async fn session_by_id(&self, id: &str) -> Result<Option<Session>, StoreError>;

    /// Conditionally refresh a session's access/expiry timestamps.
    ///
    /// Updates only while the record is unexpired at `accessed_at`, and
    /// returns the updated row; `None` covers both missing and lapsed.
    async fn bump_session(
        &self,
        id: &str,
        accessed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError>;

    async fn sessions_for_user(&self, user: &str) -> Result<Vec<Session>, StoreError>;

    /// Rename the device label; returns the updated row, `None` if missing.
    async fn rename_session_device(
        &self,
        id: &str,
        device: &str,
    ) -> Result<Option<Session>, StoreError>;

    /// Delete a session; `true` when a row was removed.
    async fn delete_session(&self, id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ChallengeRepo: Send + Sync {
    async fn insert_challenge(&self, challenge: &ChallengeCode) -> Result<(), StoreError>;

    async fn challenge_by_code(&self, code: &str) -> Result<Option<ChallengeCode>, StoreError>;

    /// Atomically delete a challenge. Of two callers racing on the same
    /// code, exactly one gets `true`.
    async fn consume_challenge(&self, code: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait BookmarkRepo: Send + Sync {
    async fn bookmarks_for_user(&self, user: &str) -> Result<Vec<Bookmark>, StoreError>;

    async fn bookmark(&self, user: &str, tmdb_id: &str) -> Result<Option<Bookmark>, StoreError>;

    async fn upsert_bookmark(&self, bookmark: &Bookmark) -> Result<(), StoreError>;

    /// Delete a bookmark; `true` when a row was removed.
    async fn delete_bookmark(&self, user: &str, tmdb_id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ProgressRepo: Send + Sync {
    async fn progress_for_user(&self, user: &str) -> Result<Vec<ProgressItem>, StoreError>;

    /// Look up the row for a (tmdb, user, season slot, episode slot) key.
    async fn progress_by_slot(
        &self,
        user: &str,
        tmdb_id: &str,
        season_id: Option<&str>,
        episode_id: Option<&str>,
    ) -> Result<Option<ProgressItem>, StoreError>;

    /// Insert or replace by item id.
    async fn upsert_progress(&self, item: &ProgressItem) -> Result<(), StoreError>;

    /// Delete rows for `(user, tmdb_id)`, optionally narrowed to a season
    /// and/or episode slot. Returns the number of rows removed.
    async fn delete_progress(
        &self,
        user: &str,
        tmdb_id: &str,
        season_id: Option<&str>,
        episode_id: Option<&str>,
    ) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn settings_for_user(&self, user: &str) -> Result<Option<UserSettings>, StoreError>;

    async fn upsert_settings(&self, settings: &UserSettings) -> Result<(), StoreError>;
}

/// The full persistence surface the application is wired against.
pub trait Store:
    UserRepo + SessionRepo + ChallengeRepo + BookmarkRepo + ProgressRepo + SettingsRepo
{
}

impl<T> Store for T where
    T: UserRepo + SessionRepo + ChallengeRepo + BookmarkRepo + ProgressRepo + SettingsRepo
{
}
