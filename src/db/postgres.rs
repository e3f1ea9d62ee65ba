//! PostgreSQL implementation of the repository traits.
//!
//! Queries are runtime-checked and rely on single-statement atomicity for
//! the operations the auth core cares about: the unique index on
//! `users.public_key` arbitrates duplicate registrations, a conditional
//! `UPDATE ... WHERE expires_at >= $now RETURNING` implements the session
//! bump, and a plain `DELETE ... WHERE code = $1` consumes a challenge for
//! exactly one caller.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;

use super::models::{
    Bookmark, BookmarkMeta, ChallengeCode, ProgressItem, ProgressMeta, Session, User, UserProfile,
    UserSettings,
};
use super::repository::{
    BookmarkRepo, ChallengeRepo, ProgressRepo, SessionRepo, SettingsRepo, StoreError, UserRepo,
};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate a uniqueness violation into the typed conflict the handlers
/// map to 409; everything else stays a database error.
fn map_insert_err(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::Database(err),
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    namespace: String,
    public_key: String,
    profile: serde_json::Value,
    permissions: Vec<String>,
    created_at: DateTime<Utc>,
    last_logged_in: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, StoreError> {
        let profile: UserProfile = serde_json::from_value(row.profile)?;
        Ok(User {
            id: row.id,
            namespace: row.namespace,
            public_key: row.public_key,
            profile,
            permissions: row.permissions,
            created_at: row.created_at,
            last_logged_in: row.last_logged_in,
        })
    }
}

const USER_COLUMNS: &str =
    "id, namespace, public_key, profile, permissions, created_at, last_logged_in";

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    user_id: String,
    device: String,
    user_agent: String,
    created_at: DateTime<Utc>,
    accessed_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: row.id,
            user: row.user_id,
            device: row.device,
            user_agent: row.user_agent,
            created_at: row.created_at,
            accessed_at: row.accessed_at,
            expires_at: row.expires_at,
        }
    }
}

const SESSION_COLUMNS: &str =
    "id, user_id, device, user_agent, created_at, accessed_at, expires_at";

#[derive(sqlx::FromRow)]
struct ChallengeRow {
    code: String,
    flow: String,
    auth_type: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<ChallengeRow> for ChallengeCode {
    fn from(row: ChallengeRow) -> Self {
        ChallengeCode {
            code: row.code,
            flow: row.flow,
            auth_type: row.auth_type,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookmarkRow {
    tmdb_id: String,
    user_id: String,
    meta: serde_json::Value,
    #[sqlx(rename = "group")]
    group: Vec<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookmarkRow> for Bookmark {
    type Error = StoreError;

    fn try_from(row: BookmarkRow) -> Result<Self, StoreError> {
        let meta: BookmarkMeta = serde_json::from_value(row.meta)?;
        Ok(Bookmark {
            tmdb_id: row.tmdb_id,
            user_id: row.user_id,
            meta,
            group: row.group,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProgressRow {
    id: String,
    tmdb_id: String,
    user_id: String,
    season_id: Option<String>,
    episode_id: Option<String>,
    season_number: Option<i32>,
    episode_number: Option<i32>,
    duration: i64,
    watched: i64,
    meta: serde_json::Value,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProgressRow> for ProgressItem {
    type Error = StoreError;

    fn try_from(row: ProgressRow) -> Result<Self, StoreError> {
        let meta: ProgressMeta = serde_json::from_value(row.meta)?;
        Ok(ProgressItem {
            id: row.id,
            tmdb_id: row.tmdb_id,
            user_id: row.user_id,
            season_id: row.season_id,
            episode_id: row.episode_id,
            season_number: row.season_number,
            episode_number: row.episode_number,
            duration: row.duration,
            watched: row.watched,
            meta,
            updated_at: row.updated_at,
        })
    }
}

const PROGRESS_COLUMNS: &str = "id, tmdb_id, user_id, season_id, episode_id, season_number, \
     episode_number, duration, watched, meta, updated_at";

#[derive(sqlx::FromRow)]
struct SettingsRow {
    id: String,
    application_theme: Option<String>,
    application_language: Option<String>,
    default_subtitle_language: Option<String>,
    proxy_urls: Option<Vec<String>>,
    trakt_key: Option<String>,
    febbox_key: Option<String>,
}

impl From<SettingsRow> for UserSettings {
    fn from(row: SettingsRow) -> Self {
        UserSettings {
            user_id: row.id,
            application_theme: row.application_theme,
            application_language: row.application_language,
            default_subtitle_language: row.default_subtitle_language,
            proxy_urls: row.proxy_urls,
            trakt_key: row.trakt_key,
            febbox_key: row.febbox_key,
        }
    }
}

#[async_trait]
impl UserRepo for PgStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let profile = serde_json::to_value(&user.profile)?;
        sqlx::query(
            "INSERT INTO users (id, namespace, public_key, profile, permissions, created_at, last_logged_in) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&user.id)
        .bind(&user.namespace)
        .bind(&user.public_key)
        .bind(&profile)
        .bind(&user.permissions)
        .bind(user.created_at)
        .bind(user.last_logged_in)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;
        Ok(())
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(User::try_from).transpose()
    }

    async fn user_by_public_key(&self, public_key: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE public_key = $1"
        ))
        .bind(public_key)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET last_logged_in = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &str,
        profile: &UserProfile,
    ) -> Result<Option<User>, StoreError> {
        let profile = serde_json::to_value(profile)?;
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET profile = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&profile)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl SessionRepo for PgStore {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO sessions (id, user_id, device, user_agent, created_at, accessed_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&session.id)
        .bind(&session.user)
        .bind(&session.device)
        .bind(&session.user_agent)
        .bind(session.created_at)
        .bind(session.accessed_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;
        Ok(())
    }

    async fn session_by_id(&self, id: &str) -> Result<Option<Session>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Session::from))
    }

    async fn bump_session(
        &self,
        id: &str,
        accessed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        // Conditional single-statement update: an expired row is left
        // untouched and reads as absent.
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "UPDATE sessions SET accessed_at = $2, expires_at = $3 \
             WHERE id = $1 AND expires_at >= $2 RETURNING {SESSION_COLUMNS}"
        ))
        .bind(id)
        .bind(accessed_at)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Session::from))
    }

    async fn sessions_for_user(&self, user: &str) -> Result<Vec<Session>, StoreError> {
        let rows: Vec<SessionRow> = sqlx::query_as(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE user_id = $1 ORDER BY created_at"
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Session::from).collect())
    }

    async fn rename_session_device(
        &self,
        id: &str,
        device: &str,
    ) -> Result<Option<Session>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "UPDATE sessions SET device = $2 WHERE id = $1 RETURNING {SESSION_COLUMNS}"
        ))
        .bind(id)
        .bind(device)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Session::from))
    }

    async fn delete_session(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ChallengeRepo for PgStore {
    async fn insert_challenge(&self, challenge: &ChallengeCode) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO challenge_codes (code, flow, auth_type, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&challenge.code)
        .bind(&challenge.flow)
        .bind(&challenge.auth_type)
        .bind(challenge.created_at)
        .bind(challenge.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;
        Ok(())
    }

    async fn challenge_by_code(&self, code: &str) -> Result<Option<ChallengeCode>, StoreError> {
        let row: Option<ChallengeRow> = sqlx::query_as(
            "SELECT code, flow, auth_type, created_at, expires_at \
             FROM challenge_codes WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ChallengeCode::from))
    }

    async fn consume_challenge(&self, code: &str) -> Result<bool, StoreError> {
        // DELETE by key: of two racing consumers, one sees rows_affected=1
        // and the other 0.
        let result = sqlx::query("DELETE FROM challenge_codes WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BookmarkRepo for PgStore {
    async fn bookmarks_for_user(&self, user: &str) -> Result<Vec<Bookmark>, StoreError> {
        let rows: Vec<BookmarkRow> = sqlx::query_as(
            "SELECT tmdb_id, user_id, meta, \"group\", updated_at \
             FROM bookmarks WHERE user_id = $1 ORDER BY updated_at DESC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Bookmark::try_from).collect()
    }

    async fn bookmark(&self, user: &str, tmdb_id: &str) -> Result<Option<Bookmark>, StoreError> {
        let row: Option<BookmarkRow> = sqlx::query_as(
            "SELECT tmdb_id, user_id, meta, \"group\", updated_at \
             FROM bookmarks WHERE user_id = $1 AND tmdb_id = $2",
        )
        .bind(user)
        .bind(tmdb_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Bookmark::try_from).transpose()
    }

    async fn upsert_bookmark(&self, bookmark: &Bookmark) -> Result<(), StoreError> {
        let meta = serde_json::to_value(&bookmark.meta)?;
        sqlx::query(
            "INSERT INTO bookmarks (tmdb_id, user_id, meta, \"group\", updated_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (tmdb_id, user_id) DO UPDATE \
             SET meta = EXCLUDED.meta, \"group\" = EXCLUDED.\"group\", updated_at = EXCLUDED.updated_at",
        )
        .bind(&bookmark.tmdb_id)
        .bind(&bookmark.user_id)
        .bind(&meta)
        .bind(&bookmark.group)
        .bind(bookmark.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_bookmark(&self, user: &str, tmdb_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND tmdb_id = $2")
            .bind(user)
            .bind(tmdb_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProgressRepo for PgStore {
    async fn progress_for_user(&self, user: &str) -> Result<Vec<ProgressItem>, StoreError> {
        let rows: Vec<ProgressRow> = sqlx::query_as(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress_items \
             WHERE user_id = $1 ORDER BY updated_at DESC"
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ProgressItem::try_from).collect()
    }

    async fn progress_by_slot(
        &self,
        user: &str,
        tmdb_id: &str,
        season_id: Option<&str>,
        episode_id: Option<&str>,
    ) -> Result<Option<ProgressItem>, StoreError> {
        let row: Option<ProgressRow> = sqlx::query_as(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress_items \
             WHERE user_id = $1 AND tmdb_id = $2 \
             AND season_id IS NOT DISTINCT FROM $3 \
             AND episode_id IS NOT DISTINCT FROM $4"
        ))
        .bind(user)
        .bind(tmdb_id)
        .bind(season_id)
        .bind(episode_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ProgressItem::try_from).transpose()
    }

    async fn upsert_progress(&self, item: &ProgressItem) -> Result<(), StoreError> {
        let meta = serde_json::to_value(&item.meta)?;
        sqlx::query(
            "INSERT INTO progress_items \
             (id, tmdb_id, user_id, season_id, episode_id, season_number, episode_number, \
              duration, watched, meta, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (id) DO UPDATE \
             SET duration = EXCLUDED.duration, watched = EXCLUDED.watched, \
                 meta = EXCLUDED.meta, updated_at = EXCLUDED.updated_at, \
                 season_number = EXCLUDED.season_number, episode_number = EXCLUDED.episode_number",
        )
        .bind(&item.id)
        .bind(&item.tmdb_id)
        .bind(&item.user_id)
        .bind(&item.season_id)
        .bind(&item.episode_id)
        .bind(item.season_number)
        .bind(item.episode_number)
        .bind(item.duration)
        .bind(item.watched)
        .bind(&meta)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_progress(
        &self,
        user: &str,
        tmdb_id: &str,
        season_id: Option<&str>,
        episode_id: Option<&str>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM progress_items \
             WHERE user_id = $1 AND tmdb_id = $2 \
             AND ($3::text IS NULL OR season_id = $3) \
             AND ($4::text IS NULL OR episode_id = $4)",
        )
        .bind(user)
        .bind(tmdb_id)
        .bind(season_id)
        .bind(episode_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SettingsRepo for PgStore {
    async fn settings_for_user(&self, user: &str) -> Result<Option<UserSettings>, StoreError> {
        let row: Option<SettingsRow> = sqlx::query_as(
            "SELECT id, application_theme, application_language, default_subtitle_language, \
             proxy_urls, trakt_key, febbox_key FROM user_settings WHERE id = $1",
        )
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserSettings::from))
    }

    async fn upsert_settings(&self, settings: &UserSettings) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO user_settings \
             (id, application_theme, application_language, default_subtitle_language, \
              proxy_urls, trakt_key, febbox_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (id) DO UPDATE \
             SET application_theme = EXCLUDED.application_theme, \
                 application_language = EXCLUDED.application_language, \
                 default_subtitle_language = EXCLUDED.default_subtitle_language, \
                 proxy_urls = EXCLUDED.proxy_urls, \
                 trakt_key = EXCLUDED.trakt_key, \
                 febbox_key = EXCLUDED.febbox_key",
        )
        .bind(&settings.user_id)
        .bind(&settings.application_theme)
        .bind(&settings.application_language)
        .bind(&settings.default_subtitle_language)
        .bind(&settings.proxy_urls)
        .bind(&settings.trakt_key)
        .bind(&settings.febbox_key)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
