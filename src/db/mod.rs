//! Persistence layer: connection management, data models, and the
//! repository traits with their PostgreSQL and in-memory implementations.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

pub use memory::MemoryStore;
pub use models::{
    Bookmark, BookmarkMediaType, BookmarkMeta, ChallengeCode, MOVIE_SLOT, ProgressItem,
    ProgressMediaType, ProgressMeta, Session, User, UserProfile, UserSettings,
};
pub use postgres::PgStore;
pub use repository::{
    BookmarkRepo, ChallengeRepo, ProgressRepo, SessionRepo, SettingsRepo, Store, StoreError,
    UserRepo,
};

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// PostgreSQL connection pool wrapper.
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new connection pool.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        tracing::info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
