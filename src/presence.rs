use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::auth::extractors::AuthUser;
use crate::state::AppState;

/// Name of the shared presence channel, kept from the hosted original.
pub const CHANNEL: &str = "system-global";

/// In-process membership registry backing the online-user count.
///
/// Advisory only: the count is an eventually-consistent display signal and
/// must never drive correctness-critical decisions. Members are keyed by
/// user id, so repeated heartbeats from the same user stay a single entry.
#[derive(Clone)]
pub struct Presence {
    members: Arc<RwLock<HashMap<Uuid, OffsetDateTime>>>,
    ttl: Duration,
}

impl Presence {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            members: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    pub fn track(&self, user_id: Uuid) {
        self.track_at(user_id, OffsetDateTime::now_utc());
    }

    fn track_at(&self, user_id: Uuid, online_at: OffsetDateTime) {
        let mut members = self.members.write().unwrap_or_else(|e| e.into_inner());
        members.insert(user_id, online_at);
        debug!(channel = CHANNEL, %user_id, "presence tracked");
    }

    pub fn untrack(&self, user_id: Uuid) {
        let mut members = self.members.write().unwrap_or_else(|e| e.into_inner());
        members.remove(&user_id);
        debug!(channel = CHANNEL, %user_id, "presence untracked");
    }

    /// Member-set size with stale entries pruned, floored at 1.
    pub fn online_count(&self) -> usize {
        self.online_count_at(OffsetDateTime::now_utc())
    }

    fn online_count_at(&self, now: OffsetDateTime) -> usize {
        let cutoff = now - self.ttl;
        let mut members = self.members.write().unwrap_or_else(|e| e.into_inner());
        members.retain(|_, online_at| *online_at > cutoff);
        members.len().max(1)
    }
}

#[derive(Debug, Serialize)]
pub struct OnlineResponse {
    pub online: usize,
}

#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub tracked: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/presence/heartbeat", post(heartbeat))
        .route("/presence/online", get(online))
}

#[instrument(skip(state))]
async fn heartbeat(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<HeartbeatResponse> {
    state.presence.track(user_id);
    Json(HeartbeatResponse { tracked: true })
}

#[instrument(skip(state))]
async fn online(State(state): State<AppState>) -> Json<OnlineResponse> {
    Json(OnlineResponse {
        online: state.presence.online_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_floors_count_at_one() {
        let presence = Presence::new(90);
        assert_eq!(presence.online_count(), 1);
    }

    #[test]
    fn repeated_heartbeats_count_once_per_user() {
        let presence = Presence::new(90);
        let user = Uuid::new_v4();
        presence.track(user);
        presence.track(user);
        assert_eq!(presence.online_count(), 1);

        presence.track(Uuid::new_v4());
        assert_eq!(presence.online_count(), 2);
    }

    #[test]
    fn untrack_removes_member() {
        let presence = Presence::new(90);
        let a = Uuid::new_v4();
        presence.track(a);
        presence.track(Uuid::new_v4());
        presence.untrack(a);
        assert_eq!(presence.online_count(), 1);
    }

    #[test]
    fn registry_survives_a_poisoned_lock() {
        let presence = Presence::new(90);
        presence.track(Uuid::new_v4());

        let poisoner = presence.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.members.write().unwrap();
            panic!("poison the registry lock");
        })
        .join();

        presence.track(Uuid::new_v4());
        assert_eq!(presence.online_count(), 2);
    }

    #[test]
    fn stale_entries_are_pruned() {
        let presence = Presence::new(90);
        let now = OffsetDateTime::now_utc();
        presence.track_at(Uuid::new_v4(), now - Duration::seconds(120));
        presence.track_at(Uuid::new_v4(), now - Duration::seconds(10));
        assert_eq!(presence.online_count_at(now), 1);
    }
}
