//! In-memory watch-party presence relay.
//!
//! Clients in a shared room post player-status snapshots and poll for each
//! other's. Nothing here is durable: entries live for one minute, each
//! (user, room) pair keeps its five most recent snapshots, and a background
//! sweep drops what polling did not already prune.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Snapshots older than this are never served and get swept.
pub const STATUS_RETENTION: Duration = Duration::from_secs(60);

/// Most recent snapshots kept per (user, room).
const MAX_SNAPSHOTS: usize = 5;

/// What a party member is currently watching.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContentInfo {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<i64>,
}

/// Transport/playback state of a party member's player.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerState {
    pub is_playing: bool,
    pub is_paused: bool,
    pub is_loading: bool,
    pub has_played_once: bool,
    pub time: f64,
    pub duration: f64,
    pub volume: f64,
    pub playback_rate: f64,
    pub buffered: f64,
}

/// One status snapshot as relayed between party members.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    pub user_id: String,
    pub room_code: String,
    pub is_host: bool,
    pub content: ContentInfo,
    pub player: PlayerState,
    /// Milliseconds since the Unix epoch, assigned server-side.
    pub timestamp: i64,
}

/// Thread-safe status store, keyed by (user id, room code).
#[derive(Default)]
pub struct PlayerStatusHub {
    store: DashMap<(String, String), Vec<PlayerStatus>>,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn cutoff_ms() -> i64 {
    now_ms() - STATUS_RETENTION.as_millis() as i64
}

impl PlayerStatusHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot, stamping it with the server clock.
    ///
    /// Returns the assigned timestamp.
    pub fn push(&self, mut status: PlayerStatus) -> i64 {
        status.timestamp = now_ms();
        let timestamp = status.timestamp;
        let key = (status.user_id.clone(), status.room_code.clone());

        let mut entry = self.store.entry(key).or_default();
        let cutoff = cutoff_ms();
        entry.retain(|s| s.timestamp >= cutoff);
        entry.push(status);
        if entry.len() > MAX_SNAPSHOTS {
            let excess = entry.len() - MAX_SNAPSHOTS;
            entry.drain(..excess);
        }

        timestamp
    }

    /// Recent snapshots for one user in one room.
    pub fn statuses_for(&self, user_id: &str, room_code: &str) -> Vec<PlayerStatus> {
        let key = (user_id.to_string(), room_code.to_string());
        let cutoff = cutoff_ms();

        match self.store.get_mut(&key) {
            Some(mut entry) => {
                // Prune on read so stale entries do not linger until the sweep.
                entry.retain(|s| s.timestamp >= cutoff);
                entry.clone()
            }
            None => Vec::new(),
        }
    }

    /// Recent snapshots for every user in a room, grouped by user id.
    pub fn room_snapshot(&self, room_code: &str) -> HashMap<String, Vec<PlayerStatus>> {
        let cutoff = cutoff_ms();
        let mut users = HashMap::new();

        for entry in self.store.iter() {
            let (user_id, room) = entry.key();
            if room.as_str() != room_code {
                continue;
            }
            let recent: Vec<PlayerStatus> = entry
                .value()
                .iter()
                .filter(|s| s.timestamp >= cutoff)
                .cloned()
                .collect();
            if !recent.is_empty() {
                users.insert(user_id.clone(), recent);
            }
        }

        users
    }

    /// Drop expired snapshots and empty keys.
    pub fn sweep(&self) {
        let cutoff = cutoff_ms();
        self.store.retain(|_, statuses| {
            statuses.retain(|s| s.timestamp >= cutoff);
            !statuses.is_empty()
        });
    }

    /// Run `sweep` on an interval for the lifetime of the process.
    pub fn spawn_sweeper(hub: Arc<Self>) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(STATUS_RETENTION);
            // The first tick fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                hub.sweep();
            }
        });
    }
}
