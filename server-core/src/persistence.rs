//! C14: the optional Persistence Adapter (§4.15). Only the interface is implemented
//! here; a real document-store-backed adapter is out of scope (§1) — this ships an
//! in-memory implementation and a no-op one (selected by [`crate::config::Config`]'s
//! absent `FIREBASE_SERVICE_ACCOUNT_JSON`).

use std::collections::HashMap;

use async_trait::async_trait;
use protocol::RoomCode;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// A stable-shape subset of a room (§4.15).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomPlayerSummary {
    pub id: String,
    pub name: String,
    pub is_host: bool,
    pub joined_at_millis: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummary {
    pub code: String,
    pub name: String,
    pub host_name: String,
    pub status: String,
    pub players: Vec<RoomPlayerSummary>,
    pub max_players: u16,
    pub created_at_millis: u64,
    pub updated_at_millis: u64,
}

/// Write-through interface invoked on room create/join/leave/status-change for public
/// rooms, and delete on teardown (§4.15). Failures are logged and swallowed by the
/// caller; this trait itself returns `Result` so an implementation can report detail
/// to its own logging, but callers must never propagate a failure into room state.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    async fn save_room(&self, summary: RoomSummary) -> Result<(), String>;
    async fn delete_room(&self, code: &RoomCode) -> Result<(), String>;
    async fn list_open_rooms(&self) -> Result<Vec<RoomSummary>, String>;
    async fn cleanup_stale(&self, older_than_millis: u64) -> Result<usize, String>;
}

/// In-memory stand-in used when no external document store is configured, and as the
/// default in tests. `ListOpenRooms` over this adapter degenerates to "whatever was
/// last saved", matching §4.15's fallback ("if absent, `ListOpenRooms` returns
/// in-memory rooms").
#[derive(Default)]
pub struct InMemoryPersistenceAdapter {
    rooms: Mutex<HashMap<String, RoomSummary>>,
}

impl InMemoryPersistenceAdapter {
    pub fn new() -> Self {
        InMemoryPersistenceAdapter::default()
    }
}

#[async_trait]
impl PersistenceAdapter for InMemoryPersistenceAdapter {
    async fn save_room(&self, summary: RoomSummary) -> Result<(), String> {
        self.rooms.lock().await.insert(summary.code.clone(), summary);
        Ok(())
    }

    async fn delete_room(&self, code: &RoomCode) -> Result<(), String> {
        self.rooms.lock().await.remove(&code.0);
        Ok(())
    }

    async fn list_open_rooms(&self) -> Result<Vec<RoomSummary>, String> {
        Ok(self.rooms.lock().await.values().cloned().collect())
    }

    async fn cleanup_stale(&self, older_than_millis: u64) -> Result<usize, String> {
        let mut rooms = self.rooms.lock().await;
        let before = rooms.len();
        rooms.retain(|_, r| r.updated_at_millis >= older_than_millis);
        Ok(before - rooms.len())
    }
}

/// Used when `FIREBASE_SERVICE_ACCOUNT_JSON` is absent: every call is a no-op (§4.15:
/// "the adapter is optional; if absent, ... the adapter calls are no-ops").
#[derive(Default)]
pub struct NoopPersistenceAdapter;

#[async_trait]
impl PersistenceAdapter for NoopPersistenceAdapter {
    async fn save_room(&self, _summary: RoomSummary) -> Result<(), String> {
        Ok(())
    }

    async fn delete_room(&self, _code: &RoomCode) -> Result<(), String> {
        Ok(())
    }

    async fn list_open_rooms(&self) -> Result<Vec<RoomSummary>, String> {
        Ok(Vec::new())
    }

    async fn cleanup_stale(&self, _older_than_millis: u64) -> Result<usize, String> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(code: &str, updated_at_millis: u64) -> RoomSummary {
        RoomSummary {
            code: code.to_string(),
            name: "room".to_string(),
            host_name: "host".to_string(),
            status: "waiting".to_string(),
            players: Vec::new(),
            max_players: 4,
            created_at_millis: 0,
            updated_at_millis,
        }
    }

    #[tokio::test]
    async fn save_then_list_round_trips() {
        let adapter = InMemoryPersistenceAdapter::new();
        adapter.save_room(summary("ABCDE", 100)).await.unwrap();
        let rooms = adapter.list_open_rooms().await.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].code, "ABCDE");
    }

    #[tokio::test]
    async fn delete_removes_room() {
        let adapter = InMemoryPersistenceAdapter::new();
        adapter.save_room(summary("ABCDE", 100)).await.unwrap();
        adapter.delete_room(&RoomCode("ABCDE".into())).await.unwrap();
        assert!(adapter.list_open_rooms().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cleanup_stale_evicts_old_rooms_only() {
        let adapter = InMemoryPersistenceAdapter::new();
        adapter.save_room(summary("OLD01", 10)).await.unwrap();
        adapter.save_room(summary("NEW01", 1000)).await.unwrap();
        let removed = adapter.cleanup_stale(500).await.unwrap();
        assert_eq!(removed, 1);
        let remaining = adapter.list_open_rooms().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].code, "NEW01");
    }

    #[tokio::test]
    async fn noop_adapter_never_stores_anything() {
        let adapter = NoopPersistenceAdapter;
        adapter.save_room(summary("ABCDE", 100)).await.unwrap();
        assert!(adapter.list_open_rooms().await.unwrap().is_empty());
    }
}
