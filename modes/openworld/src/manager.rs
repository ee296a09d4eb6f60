//! The open-world Room Manager (§4.8 common operations). Owns every open-world room
//! behind one mutex (documented simplification, see `DESIGN.md`) and implements
//! [`server_core::ModeRouter`] so the dispatcher can route `mw_*` frames here
//! directly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use protocol::{RoomCode, ServerError, SessionId};
use serde_json::Value;
use server_core::room::{draw_game_seed, draw_unique_room_code, err_room_full, err_room_not_found};
use server_core::{Broadcaster, ModePlayer, ModeRouter, RoomStatus};
use tokio::sync::Mutex;

use crate::actions;
use crate::constants::MAX_PLAYERS;
use crate::player::OpenWorldPlayer;
use crate::room::OpenWorldRoom;
use crate::tick::step;

pub struct OpenWorldManager {
    rooms: Mutex<HashMap<RoomCode, OpenWorldRoom>>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl OpenWorldManager {
    pub fn new(broadcaster: Arc<dyn Broadcaster>) -> Self {
        OpenWorldManager { rooms: Mutex::new(HashMap::new()), broadcaster }
    }

    pub async fn create_room(&self, host: SessionId, name: String, display_name: String) -> Result<RoomCode, ServerError> {
        let mut rooms = self.rooms.lock().await;
        let code = draw_unique_room_code(&|c| rooms.contains_key(c));
        let seed = draw_game_seed();
        let mut room = OpenWorldRoom::new(code.clone(), name, host.clone(), MAX_PLAYERS, seed);
        let slot = room.next_color_slot();
        let spawn = room.spawn_point();
        room.core.insert_player(OpenWorldPlayer::new(host, display_name, slot, spawn));
        // Open-world rooms are a persistent shared sandbox, not a lobby/countdown
        // game (§3: "shared open-world voxel mode") — playing starts immediately.
        room.core.status = RoomStatus::Playing;
        rooms.insert(code.clone(), room);
        Ok(code)
    }

    pub async fn join_room(&self, code: &RoomCode, session_id: SessionId, display_name: String) -> Result<(), ServerError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or_else(|| err_room_not_found(code))?;
        if room.core.is_full() {
            return Err(err_room_full(code));
        }
        let slot = room.next_color_slot();
        let spawn = room.spawn_point();
        room.core.insert_player(OpenWorldPlayer::new(session_id, display_name, slot, spawn));
        Ok(())
    }

    pub async fn remove_player(&self, code: &RoomCode, session_id: &SessionId) -> Result<(), ServerError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or_else(|| err_room_not_found(code))?;
        room.core.remove_player(session_id);
        if room.core.is_empty() {
            rooms.remove(code);
        }
        Ok(())
    }

    pub async fn mark_disconnected(&self, code: &RoomCode, session_id: &SessionId) -> Result<(), ServerError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or_else(|| err_room_not_found(code))?;
        if let Some(player) = room.core.player_mut(session_id) {
            player.set_connected(false);
        }
        Ok(())
    }

    pub async fn mark_reconnected(&self, code: &RoomCode, session_id: &SessionId) -> Result<(), ServerError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or_else(|| err_room_not_found(code))?;
        if let Some(player) = room.core.player_mut(session_id) {
            player.set_connected(true);
        }
        Ok(())
    }

    /// Transport-layer disconnect/reconnect hooks that don't know which room a
    /// session belongs to (§4.6): scan every room for the session rather than
    /// requiring the caller to track the mode/room mapping itself.
    pub async fn handle_session_disconnected(&self, session_id: &SessionId) {
        let mut rooms = self.rooms.lock().await;
        for room in rooms.values_mut() {
            if let Some(player) = room.core.player_mut(session_id) {
                player.set_connected(false);
            }
        }
    }

    pub async fn handle_session_reconnected(&self, session_id: &SessionId) -> bool {
        let mut rooms = self.rooms.lock().await;
        for room in rooms.values_mut() {
            if let Some(player) = room.core.player_mut(session_id) {
                player.set_connected(true);
                return true;
            }
        }
        false
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    /// Fallback sweep for rooms a handler path failed to tear down directly (watchdog).
    pub async fn sweep_empty_rooms(&self) {
        self.rooms.lock().await.retain(|_, room| !room.core.is_empty());
    }
    pub async fn tick_all(&self) {
        let mut rooms = self.rooms.lock().await;
        for room in rooms.values_mut() {
            if room.core.status != RoomStatus::Playing {
                continue;
            }
            let outcome = step(room);
            for (session_id, snapshot) in outcome.snapshots {
                self.broadcaster.send_to_player(&session_id, snapshot.to_string()).await;
            }
        }
    }
}

fn field_str<'a>(payload: &'a Value, key: &str) -> Result<&'a str, ServerError> {
    payload.get(key).and_then(Value::as_str).ok_or_else(|| ServerError::invalid_format(format!("missing `{key}` field")))
}

fn field_i32(payload: &Value, key: &str) -> Result<i32, ServerError> {
    payload.get(key).and_then(Value::as_i64).map(|v| v as i32).ok_or_else(|| ServerError::invalid_format(format!("missing `{key}` field")))
}

#[async_trait]
impl ModeRouter for OpenWorldManager {
    async fn handle(&self, session_id: SessionId, msg_type: &str, payload: Value) -> Result<(), ServerError> {
        match msg_type {
            "mw_create_room" => {
                let name = field_str(&payload, "name")?.to_string();
                let display_name = field_str(&payload, "displayName")?.to_string();
                self.create_room(session_id, name, display_name).await?;
                Ok(())
            }
            "mw_join_room" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let display_name = field_str(&payload, "displayName")?.to_string();
                self.join_room(&code, session_id, display_name).await
            }
            "mw_leave" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                self.remove_player(&code, &session_id).await
            }
            "mw_move" | "mw_mine" | "mw_place_block" | "mw_chat" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let mut rooms = self.rooms.lock().await;
                let room = rooms.get_mut(&code).ok_or_else(|| err_room_not_found(&code))?;
                let recipients: Vec<SessionId> = room.core.players().iter().map(|p| p.session_id.clone()).collect();
                let event = match msg_type {
                    "mw_move" => Some(actions::handle_move(
                        room,
                        &session_id,
                        field_i32(&payload, "x")?,
                        field_i32(&payload, "y")?,
                        field_i32(&payload, "z")?,
                    )?),
                    "mw_mine" => Some(actions::handle_mine(
                        room,
                        &session_id,
                        field_i32(&payload, "x")?,
                        field_i32(&payload, "y")?,
                        field_i32(&payload, "z")?,
                    )?),
                    "mw_place_block" => Some(actions::handle_place_block(
                        room,
                        &session_id,
                        field_i32(&payload, "x")?,
                        field_i32(&payload, "y")?,
                        field_i32(&payload, "z")?,
                    )?),
                    "mw_chat" => Some(actions::handle_chat(&session_id, field_str(&payload, "text")?.to_string())),
                    _ => unreachable!(),
                };
                drop(rooms);
                if let Some(event) = event {
                    self.broadcaster.broadcast_to(&recipients, event.to_json().to_string(), None).await;
                }
                Ok(())
            }
            other => Err(ServerError::unknown_type(format!("unknown open-world message type `{other}`"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullBroadcaster;
    #[async_trait]
    impl Broadcaster for NullBroadcaster {
        async fn send_to_player(&self, _session_id: &SessionId, _frame: String) {}
    }

    fn manager() -> OpenWorldManager {
        OpenWorldManager::new(Arc::new(NullBroadcaster))
    }

    #[tokio::test]
    async fn create_then_join_puts_both_in_the_same_room() {
        let manager = manager();
        let host = SessionId("h".into());
        let code = manager.create_room(host.clone(), "room".into(), "Host".into()).await.unwrap();
        let guest = SessionId("g".into());
        manager.join_room(&code, guest.clone(), "Guest".into()).await.unwrap();
        let rooms = manager.rooms.lock().await;
        assert_eq!(rooms.get(&code).unwrap().core.players().len(), 2);
    }

    #[tokio::test]
    async fn last_player_leaving_tears_down_the_room() {
        let manager = manager();
        let host = SessionId("h".into());
        let code = manager.create_room(host.clone(), "room".into(), "Host".into()).await.unwrap();
        manager.remove_player(&code, &host).await.unwrap();
        assert!(manager.rooms.lock().await.get(&code).is_none());
    }
}
