//! Wire types for the HTTP API.
//!
//! Request bodies carry `validator` rules where the contract constrains
//! them; responses are camelCase mirrors of the storage models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::db::{
    Bookmark, BookmarkMeta, ProgressItem, ProgressMeta, Session, User, UserProfile,
};
use crate::player::PlayerStatus;

// ============================================================================
// Auth flows
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterStartRequest {
    /// Required when the server has captcha gating enabled.
    pub captcha_token: Option<String>,
}

/// Challenge issued by a start endpoint; the client signs the exact code
/// string.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChallengeResponse {
    pub challenge: String,
}

/// A signed challenge presented to a complete endpoint.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChallengePayload {
    pub code: String,
    /// URL-safe base64 Ed25519 signature over the code string.
    pub signature: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCompleteRequest {
    pub public_key: String,
    pub challenge: ChallengePayload,
    #[validate(length(min = 1))]
    pub namespace: String,
    #[validate(length(min = 1, max = 500))]
    pub device: String,
    pub profile: UserProfile,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginStartRequest {
    pub public_key: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginCompleteRequest {
    pub public_key: String,
    pub challenge: ChallengePayload,
    #[validate(length(min = 1, max = 500))]
    pub device: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeriveKeyRequest {
    #[validate(length(min = 1))]
    pub mnemonic: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeriveKeyResponse {
    pub public_key: String,
}

// ============================================================================
// Users and sessions
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub public_key: String,
    pub namespace: String,
    pub profile: UserProfile,
    pub permissions: Vec<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            public_key: user.public_key.clone(),
            namespace: user.namespace.clone(),
            profile: user.profile.clone(),
            permissions: user.permissions.clone(),
        }
    }
}

/// User shape returned from profile mutation, including timestamps.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailResponse {
    pub id: String,
    pub public_key: String,
    pub namespace: String,
    pub profile: UserProfile,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_logged_in: DateTime<Utc>,
}

impl From<&User> for UserDetailResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            public_key: user.public_key.clone(),
            namespace: user.namespace.clone(),
            profile: user.profile.clone(),
            permissions: user.permissions.clone(),
            created_at: user.created_at,
            last_logged_in: user.last_logged_in,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: String,
    pub user: String,
    pub created_at: DateTime<Utc>,
    pub accessed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub device: String,
    pub user_agent: String,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            user: session.user.clone(),
            created_at: session.created_at,
            accessed_at: session.accessed_at,
            expires_at: session.expires_at,
            device: session.device.clone(),
            user_agent: session.user_agent.clone(),
        }
    }
}

/// Session entry in listings, flagged when it is the caller's own.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionListEntry {
    #[serde(flatten)]
    pub session: SessionResponse,
    pub current: bool,
}

impl SessionListEntry {
    pub fn new(session: &Session, current_id: &str) -> Self {
        Self {
            session: SessionResponse::from(session),
            current: session.id == current_id,
        }
    }
}

/// Everything a completed auth flow hands back.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthCompleteResponse {
    pub user: UserResponse,
    pub session: SessionResponse,
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserResponse,
    pub session: SessionResponse,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EditProfileRequest {
    pub profile: UserProfile,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    #[validate(length(min = 1, max = 500))]
    pub device_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionIdResponse {
    pub id: String,
}

// ============================================================================
// Bookmarks
// ============================================================================

/// Group labels arrive as either a single string or a list.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkInput {
    pub tmdb_id: String,
    pub meta: BookmarkMeta,
    pub group: Option<OneOrMany>,
}

/// Body for single-bookmark creation; the tmdb id comes from the path.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BookmarkBody {
    pub meta: BookmarkMeta,
    pub group: Option<OneOrMany>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkResponse {
    pub tmdb_id: String,
    pub meta: BookmarkMeta,
    pub group: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Bookmark> for BookmarkResponse {
    fn from(bookmark: &Bookmark) -> Self {
        Self {
            tmdb_id: bookmark.tmdb_id.clone(),
            meta: bookmark.meta.clone(),
            group: bookmark.group.clone(),
            updated_at: bookmark.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkDeleteResponse {
    pub tmdb_id: String,
}

// ============================================================================
// Watch progress
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdateRequest {
    pub meta: ProgressMeta,
    /// Milliseconds; fractional values are rounded.
    pub duration: f64,
    /// Milliseconds; fractional values are rounded.
    pub watched: f64,
    pub season_id: Option<String>,
    pub episode_id: Option<String>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,
    /// RFC 3339; defaulted to now and clamped server-side.
    pub updated_at: Option<String>,
}

/// Import entries carry their tmdb id in the body rather than the path.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressImportItem {
    pub tmdb_id: String,
    pub meta: ProgressMeta,
    pub duration: f64,
    pub watched: f64,
    pub season_id: Option<String>,
    pub episode_id: Option<String>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,
    pub updated_at: Option<String>,
}

/// Optional DELETE body narrowing which slots to clear.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDeleteRequest {
    pub season_id: Option<String>,
    pub episode_id: Option<String>,
    pub meta: Option<ProgressDeleteMeta>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProgressDeleteMeta {
    #[serde(rename = "type")]
    pub kind: crate::db::ProgressMediaType,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub id: String,
    pub tmdb_id: String,
    pub user_id: String,
    pub season_id: Option<String>,
    pub episode_id: Option<String>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,
    pub meta: ProgressMeta,
    pub duration: i64,
    pub watched: i64,
    pub updated_at: DateTime<Utc>,
}

impl From<&ProgressItem> for ProgressResponse {
    fn from(item: &ProgressItem) -> Self {
        Self {
            id: item.id.clone(),
            tmdb_id: item.tmdb_id.clone(),
            user_id: item.user_id.clone(),
            season_id: item.wire_season_id().map(str::to_string),
            episode_id: item.wire_episode_id().map(str::to_string),
            season_number: item.season_number,
            episode_number: item.episode_number,
            meta: item.meta.clone(),
            duration: item.duration,
            watched: item.watched,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDeleteResponse {
    pub count: u64,
    pub tmdb_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_id: Option<String>,
}

// ============================================================================
// Settings
// ============================================================================

/// Settings PUT body. Keys are snake_case on the wire; only present fields
/// are updated.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SettingsRequest {
    pub application_theme: Option<String>,
    pub application_language: Option<String>,
    pub default_subtitle_language: Option<String>,
    pub proxy_urls: Option<Vec<String>>,
    pub trakt_key: Option<String>,
    pub febbox_key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsData {
    pub application_theme: Option<String>,
    pub application_language: Option<String>,
    pub default_subtitle_language: Option<String>,
    pub proxy_urls: Vec<String>,
    pub trakt_key: Option<String>,
    pub febbox_key: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsEnvelope {
    pub settings: SettingsData,
}

impl From<&crate::db::UserSettings> for SettingsData {
    fn from(settings: &crate::db::UserSettings) -> Self {
        Self {
            application_theme: settings.application_theme.clone(),
            application_language: settings.application_language.clone(),
            default_subtitle_language: settings.default_subtitle_language.clone(),
            proxy_urls: settings.proxy_urls.clone().unwrap_or_default(),
            trakt_key: settings.trakt_key.clone(),
            febbox_key: settings.febbox_key.clone(),
        }
    }
}

// ============================================================================
// Watch-party player status
// ============================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatusRequest {
    pub user_id: Option<String>,
    pub room_code: Option<String>,
    #[serde(default)]
    pub is_host: bool,
    pub content: Option<crate::player::ContentInfo>,
    pub player: Option<crate::player::PlayerState>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlayerStatusAck {
    pub success: bool,
    pub timestamp: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PlayerStatusQuery {
    pub user_id: Option<String>,
    pub room_code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusesResponse {
    pub user_id: String,
    pub room_code: String,
    pub statuses: Vec<PlayerStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatusesResponse {
    pub room_code: String,
    pub users: HashMap<String, Vec<PlayerStatus>>,
}

// ============================================================================
// Service meta
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetaResponse {
    pub name: String,
    pub description: String,
    pub version: &'static str,
    pub has_captcha: bool,
    pub captcha_client_key: String,
}
