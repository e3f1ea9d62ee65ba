//! screening_room backend entry point.
//!
//! Select the environment with `APP_ENV` (default `dev`); configuration is
//! read from `config/{env}.yaml` with secrets overridable via env vars.

use std::sync::Arc;

use screening_room::config::AppConfig;
use screening_room::db::{Database, MemoryStore, PgStore, Store};
use screening_room::gateway::{self, state::AppState};
use screening_room::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());
    let config = AppConfig::load(&env)?;
    let _guard = logging::init_logging(&config);

    let store: Arc<dyn Store> = match &config.postgres_url {
        Some(url) => {
            let db = Database::connect(url).await?;
            db.health_check().await?;
            Arc::new(PgStore::new(db.pool().clone()))
        }
        None => {
            tracing::warn!("no postgres_url configured; using in-memory store (dev mode)");
            Arc::new(MemoryStore::new())
        }
    };

    let state = Arc::new(AppState::new(store, &config));
    gateway::run_server(&config, state).await
}
