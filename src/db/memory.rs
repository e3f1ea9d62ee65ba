//! In-memory store backing the test suite and secret-only dev deployments.
//!
//! Thread-safe via DashMap; the conditional operations the auth core relies
//! on (challenge consumption, session bump, unique public keys) are atomic
//! per entry, matching the guarantees of the PostgreSQL implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::models::{
    Bookmark, ChallengeCode, ProgressItem, Session, User, UserProfile, UserSettings,
};
use super::repository::{
    BookmarkRepo, ChallengeRepo, ProgressRepo, SessionRepo, SettingsRepo, StoreError, UserRepo,
};

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    /// public key -> user id; the uniqueness arbiter for registration.
    users_by_key: DashMap<String, String>,
    sessions: DashMap<String, Session>,
    challenges: DashMap<String, ChallengeCode>,
    /// (user id, tmdb id) -> bookmark
    bookmarks: DashMap<(String, String), Bookmark>,
    progress: DashMap<String, ProgressItem>,
    settings: DashMap<String, UserSettings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a session record directly; test hook for aging sessions.
    #[cfg(test)]
    pub fn replace_session(&self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        use dashmap::mapref::entry::Entry;

        // The key index entry is the atomic claim: a second registration for
        // the same public key loses here regardless of interleaving.
        match self.users_by_key.entry(user.public_key.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
                self.users.insert(user.id.clone(), user.clone());
                Ok(())
            }
        }
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(id).map(|entry| entry.clone()))
    }

    async fn user_by_public_key(&self, public_key: &str) -> Result<Option<User>, StoreError> {
        let Some(id) = self.users_by_key.get(public_key) else {
            return Ok(None);
        };
        Ok(self.users.get(id.value()).map(|entry| entry.clone()))
    }

    async fn touch_last_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        if let Some(mut user) = self.users.get_mut(id) {
            user.last_logged_in = at;
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &str,
        profile: &UserProfile,
    ) -> Result<Option<User>, StoreError> {
        match self.users.get_mut(id) {
            Some(mut user) => {
                user.profile = profile.clone();
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SessionRepo for MemoryStore {
    async fn insert_session(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn session_by_id(&self, id: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn bump_session(
        &self,
        id: &str,
        accessed_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        // get_mut holds the shard lock, so check-then-update is atomic.
        match self.sessions.get_mut(id) {
            Some(mut session) if session.expires_at >= accessed_at => {
                session.accessed_at = accessed_at;
                session.expires_at = expires_at;
                Ok(Some(session.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn sessions_for_user(&self, user: &str) -> Result<Vec<Session>, StoreError> {
        let mut sessions: Vec<Session> = self
            .sessions
            .iter()
            .filter(|entry| entry.user == user)
            .map(|entry| entry.clone())
            .collect();
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(sessions)
    }

    async fn rename_session_device(
        &self,
        id: &str,
        device: &str,
    ) -> Result<Option<Session>, StoreError> {
        match self.sessions.get_mut(id) {
            Some(mut session) => {
                session.device = device.to_string();
                Ok(Some(session.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.remove(id).is_some())
    }
}

#[async_trait]
impl ChallengeRepo for MemoryStore {
    async fn insert_challenge(&self, challenge: &ChallengeCode) -> Result<(), StoreError> {
        self.challenges
            .insert(challenge.code.clone(), challenge.clone());
        Ok(())
    }

    async fn challenge_by_code(&self, code: &str) -> Result<Option<ChallengeCode>, StoreError> {
        Ok(self.challenges.get(code).map(|entry| entry.clone()))
    }

    async fn consume_challenge(&self, code: &str) -> Result<bool, StoreError> {
        // remove() is the atomic claim: one winner per code.
        Ok(self.challenges.remove(code).is_some())
    }
}

#[async_trait]
impl BookmarkRepo for MemoryStore {
    async fn bookmarks_for_user(&self, user: &str) -> Result<Vec<Bookmark>, StoreError> {
        let mut bookmarks: Vec<Bookmark> = self
            .bookmarks
            .iter()
            .filter(|entry| entry.key().0 == user)
            .map(|entry| entry.clone())
            .collect();
        bookmarks.sort_by(|a, b| a.tmdb_id.cmp(&b.tmdb_id));
        Ok(bookmarks)
    }

    async fn bookmark(&self, user: &str, tmdb_id: &str) -> Result<Option<Bookmark>, StoreError> {
        Ok(self
            .bookmarks
            .get(&(user.to_string(), tmdb_id.to_string()))
            .map(|entry| entry.clone()))
    }

    async fn upsert_bookmark(&self, bookmark: &Bookmark) -> Result<(), StoreError> {
        self.bookmarks.insert(
            (bookmark.user_id.clone(), bookmark.tmdb_id.clone()),
            bookmark.clone(),
        );
        Ok(())
    }

    async fn delete_bookmark(&self, user: &str, tmdb_id: &str) -> Result<bool, StoreError> {
        Ok(self
            .bookmarks
            .remove(&(user.to_string(), tmdb_id.to_string()))
            .is_some())
    }
}

#[async_trait]
impl ProgressRepo for MemoryStore {
    async fn progress_for_user(&self, user: &str) -> Result<Vec<ProgressItem>, StoreError> {
        let mut items: Vec<ProgressItem> = self
            .progress
            .iter()
            .filter(|entry| entry.user_id == user)
            .map(|entry| entry.clone())
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn progress_by_slot(
        &self,
        user: &str,
        tmdb_id: &str,
        season_id: Option<&str>,
        episode_id: Option<&str>,
    ) -> Result<Option<ProgressItem>, StoreError> {
        Ok(self
            .progress
            .iter()
            .find(|entry| {
                entry.user_id == user
                    && entry.tmdb_id == tmdb_id
                    && entry.season_id.as_deref() == season_id
                    && entry.episode_id.as_deref() == episode_id
            })
            .map(|entry| entry.clone()))
    }

    async fn upsert_progress(&self, item: &ProgressItem) -> Result<(), StoreError> {
        self.progress.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn delete_progress(
        &self,
        user: &str,
        tmdb_id: &str,
        season_id: Option<&str>,
        episode_id: Option<&str>,
    ) -> Result<u64, StoreError> {
        let matching: Vec<String> = self
            .progress
            .iter()
            .filter(|entry| {
                entry.user_id == user
                    && entry.tmdb_id == tmdb_id
                    && season_id.is_none_or(|s| entry.season_id.as_deref() == Some(s))
                    && episode_id.is_none_or(|e| entry.episode_id.as_deref() == Some(e))
            })
            .map(|entry| entry.id.clone())
            .collect();

        let mut removed = 0;
        for id in matching {
            if self.progress.remove(&id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl SettingsRepo for MemoryStore {
    async fn settings_for_user(&self, user: &str) -> Result<Option<UserSettings>, StoreError> {
        Ok(self.settings.get(user).map(|entry| entry.clone()))
    }

    async fn upsert_settings(&self, settings: &UserSettings) -> Result<(), StoreError> {
        self.settings
            .insert(settings.user_id.clone(), settings.clone());
        Ok(())
    }
}
