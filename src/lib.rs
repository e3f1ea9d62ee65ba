//! screening_room - media-watching companion backend
//!
//! Passwordless backend API: clients prove control of an Ed25519 keypair by
//! signing server-issued challenge codes, then hold signed session tokens
//! with sliding 21-day expiry. Around that core sit per-user state sync
//! (bookmarks, watch progress, settings) and an ephemeral watch-party
//! presence relay.
//!
//! # Modules
//!
//! - [`auth`] - challenge codes, sessions, tokens, and the request facade
//! - [`db`] - repository traits with PostgreSQL and in-memory stores
//! - [`gateway`] - axum routers, handlers, and wire types
//! - [`player`] - in-memory watch-party status hub
//! - [`captcha`] - optional registration gate
//! - [`config`] / [`logging`] - startup plumbing

pub mod auth;
pub mod captcha;
pub mod config;
pub mod db;
pub mod gateway;
pub mod logging;
pub mod player;

// Convenient re-exports at crate root
pub use auth::{Authenticator, ChallengeService, SessionService, TokenCodec};
pub use config::AppConfig;
pub use db::{MemoryStore, PgStore, Store};
pub use gateway::state::AppState;
