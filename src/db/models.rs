//! Data models for users, sessions, challenges, and per-user state.
//!
//! JSON-shaped fields (profile, media metadata) serialize camelCase because
//! they are stored and transmitted in wire form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Small public profile blob stored on the user row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub icon: String,
    pub color_a: String,
    pub color_b: String,
}

/// An account, anchored by its unique Ed25519 public key.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    /// Tenant/grouping label chosen at registration.
    pub namespace: String,
    /// URL-safe base64 Ed25519 public key; unique across all users.
    pub public_key: String,
    pub profile: UserProfile,
    /// Opaque permission strings; carried, never interpreted here.
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_logged_in: DateTime<Utc>,
}

/// A device-bound authentication grant.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    /// Owning user's id.
    pub user: String,
    /// Free-text device label, 1-500 chars.
    pub device: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
    pub accessed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A single-use nonce issued by an auth flow's start step.
#[derive(Debug, Clone)]
pub struct ChallengeCode {
    /// Opaque unique token; doubles as the lookup key and the signed message.
    pub code: String,
    pub flow: String,
    pub auth_type: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkMediaType {
    Movie,
    Show,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkMeta {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(rename = "type")]
    pub kind: BookmarkMediaType,
}

/// A saved title, unique per (tmdb id, user).
#[derive(Debug, Clone)]
pub struct Bookmark {
    pub tmdb_id: String,
    pub user_id: String,
    pub meta: BookmarkMeta,
    pub group: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMediaType {
    Movie,
    Tv,
    Show,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMeta {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(rename = "type")]
    pub kind: ProgressMediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// Season/episode slot value stored for movie rows.
///
/// The (tmdb, user, season, episode) key must be unique, and NULLs are
/// distinct under that constraint, so movies claim a sentinel slot instead.
/// The sentinel never leaves the storage layer: it renders as null on the
/// wire.
pub const MOVIE_SLOT: &str = "\n";

/// Watch position for one title (or one episode of it).
#[derive(Debug, Clone)]
pub struct ProgressItem {
    pub id: String,
    pub tmdb_id: String,
    pub user_id: String,
    pub season_id: Option<String>,
    pub episode_id: Option<String>,
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,
    /// Milliseconds.
    pub duration: i64,
    /// Milliseconds.
    pub watched: i64,
    pub meta: ProgressMeta,
    pub updated_at: DateTime<Utc>,
}

impl ProgressItem {
    /// Season id with the movie sentinel mapped back to null for output.
    pub fn wire_season_id(&self) -> Option<&str> {
        self.season_id
            .as_deref()
            .filter(|&value| value != MOVIE_SLOT)
    }

    /// Episode id with the movie sentinel mapped back to null for output.
    pub fn wire_episode_id(&self) -> Option<&str> {
        self.episode_id
            .as_deref()
            .filter(|&value| value != MOVIE_SLOT)
    }
}

/// Per-user application preferences. Absent rows read as all-null.
#[derive(Debug, Clone, Default)]
pub struct UserSettings {
    pub user_id: String,
    pub application_theme: Option<String>,
    pub application_language: Option<String>,
    pub default_subtitle_language: Option<String>,
    pub proxy_urls: Option<Vec<String>>,
    pub trakt_key: Option<String>,
    pub febbox_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_wire_shape() {
        let profile = UserProfile {
            icon: "popcorn".to_string(),
            color_a: "#2E65CF".to_string(),
            color_b: "#C82288".to_string(),
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["colorA"], "#2E65CF");
        assert_eq!(json["colorB"], "#C82288");
    }

    #[test]
    fn test_media_type_wire_shape() {
        let meta = BookmarkMeta {
            title: "Heat".to_string(),
            year: Some(1995),
            poster: None,
            kind: BookmarkMediaType::Movie,
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "movie");
        assert!(json.get("poster").is_none());
    }

    #[test]
    fn test_movie_slot_sentinel_hidden_on_wire() {
        let now = Utc::now();
        let item = ProgressItem {
            id: "p1".to_string(),
            tmdb_id: "949".to_string(),
            user_id: "u1".to_string(),
            season_id: Some(MOVIE_SLOT.to_string()),
            episode_id: Some(MOVIE_SLOT.to_string()),
            season_number: None,
            episode_number: None,
            duration: 170 * 60 * 1000,
            watched: 60 * 60 * 1000,
            meta: ProgressMeta {
                title: "Heat".to_string(),
                poster: None,
                kind: ProgressMediaType::Movie,
                year: Some(1995),
            },
            updated_at: now,
        };
        assert_eq!(item.wire_season_id(), None);
        assert_eq!(item.wire_episode_id(), None);

        let mut episode = item.clone();
        episode.season_id = Some("s1".to_string());
        episode.episode_id = Some("e3".to_string());
        assert_eq!(episode.wire_season_id(), Some("s1"));
        assert_eq!(episode.wire_episode_id(), Some("e3"));
    }
}
