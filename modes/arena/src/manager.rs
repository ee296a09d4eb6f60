//! The arena Room Manager (§4.8 common operations). Owns every arena room behind one
//! mutex (documented simplification, see `DESIGN.md`) and implements
//! [`server_core::ModeRouter`] so the dispatcher can route `fps_*`/`arena_*`/`ms_*`
//! frames here directly (§4.7 tag-prefix routing).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use protocol::{RoomCode, ServerError, SessionId};
use serde_json::Value;
use server_core::room::{draw_game_seed, draw_unique_room_code, err_game_in_progress, err_not_host, err_room_full, err_room_not_found};
use server_core::{Broadcaster, ModePlayer, ModeRouter, RoomStatus};
use tokio::sync::Mutex;

use crate::actions;
use crate::constants::{MAX_PLAYERS, MIN_PLAYERS_TO_START};
use crate::player::ArenaPlayer;
use crate::room::ArenaRoom;
use crate::tick::step;

pub struct ArenaManager {
    rooms: Mutex<HashMap<RoomCode, ArenaRoom>>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl ArenaManager {
    pub fn new(broadcaster: Arc<dyn Broadcaster>) -> Self {
        ArenaManager { rooms: Mutex::new(HashMap::new()), broadcaster }
    }

    pub async fn create_room(&self, host: SessionId, name: String, display_name: String) -> Result<RoomCode, ServerError> {
        let mut rooms = self.rooms.lock().await;
        let code = draw_unique_room_code(&|c| rooms.contains_key(c));
        let seed = draw_game_seed();
        let mut room = ArenaRoom::new(code.clone(), name, host.clone(), MAX_PLAYERS, seed);
        let slot = room.next_color_slot();
        let spawn = room.spawn_point(0);
        room.core.insert_player(ArenaPlayer::new(host, display_name, slot, spawn));
        rooms.insert(code.clone(), room);
        Ok(code)
    }

    pub async fn join_room(&self, code: &RoomCode, session_id: SessionId, display_name: String) -> Result<(), ServerError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or_else(|| err_room_not_found(code))?;
        if room.core.status != RoomStatus::Waiting {
            return Err(err_game_in_progress(code));
        }
        if room.core.is_full() {
            return Err(err_room_full(code));
        }
        let slot = room.next_color_slot();
        let spawn = room.spawn_point(room.core.players().len() as u32);
        room.core.insert_player(ArenaPlayer::new(session_id, display_name, slot, spawn));
        Ok(())
    }

    pub async fn set_ready(&self, code: &RoomCode, session_id: &SessionId, ready: bool) -> Result<(), ServerError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or_else(|| err_room_not_found(code))?;
        let player = room.core.player_mut(session_id).ok_or_else(|| err_room_not_found(code))?;
        player.set_ready(ready);
        Ok(())
    }

    pub async fn start_game(&self, code: &RoomCode, session_id: &SessionId) -> Result<(), ServerError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or_else(|| err_room_not_found(code))?;
        if !room.core.is_host(session_id) {
            return Err(err_not_host(session_id));
        }
        if room.core.status != RoomStatus::Waiting {
            return Err(err_game_in_progress(code));
        }
        if room.core.players().len() < MIN_PLAYERS_TO_START || !room.core.all_non_host_ready() {
            return Err(ServerError::state("FPS_NOT_READY", "not all players are ready"));
        }
        room.core.seed = draw_game_seed();
        room.core.status = RoomStatus::Playing;
        let spawns: Vec<(SessionId, (f64, f64, f64))> =
            room.core.players().iter().enumerate().map(|(i, p)| (p.session_id.clone(), room.spawn_point(i as u32))).collect();
        for (session_id, spawn) in spawns {
            room.core.player_mut(&session_id).unwrap().reset_for_game_start(spawn);
        }
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
            let recipients: Vec<SessionId> = room.core.players().iter().map(|p| p.session_id.clone()).collect();
            let outcome = step(room);
            for event in outcome.events {
                self.broadcaster.broadcast_to(&recipients, event.to_json().to_string(), None).await;
            }
            if outcome.game_over {
                room.core.status = RoomStatus::Finished;
            }
        }
    }
}

fn field_str<'a>(payload: &'a Value, key: &str) -> Result<&'a str, ServerError> {
    payload.get(key).and_then(Value::as_str).ok_or_else(|| ServerError::invalid_format(format!("missing `{key}` field")))
}

fn field_f64(payload: &Value, key: &str) -> Result<f64, ServerError> {
    payload.get(key).and_then(Value::as_f64).ok_or_else(|| ServerError::invalid_format(format!("missing `{key}` field")))
}

#[async_trait]
impl ModeRouter for ArenaManager {
    async fn handle(&self, session_id: SessionId, msg_type: &str, payload: Value) -> Result<(), ServerError> {
        match msg_type {
            "fps_create_room" | "arena_create_room" => {
                let name = field_str(&payload, "name")?.to_string();
                let display_name = field_str(&payload, "displayName")?.to_string();
                self.create_room(session_id, name, display_name).await?;
                Ok(())
            }
            "fps_join_room" | "arena_join_room" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let display_name = field_str(&payload, "displayName")?.to_string();
                self.join_room(&code, session_id, display_name).await
            }
            "fps_ready" | "arena_ready" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let ready = payload.get("ready").and_then(Value::as_bool).unwrap_or(true);
                self.set_ready(&code, &session_id, ready).await
            }
            "fps_start" | "arena_start" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                self.start_game(&code, &session_id).await
            }
            "fps_leave" | "arena_leave" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                self.remove_player(&code, &session_id).await
            }
            "fps_move" | "fps_shoot" | "fps_chat" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let mut rooms = self.rooms.lock().await;
                let room = rooms.get_mut(&code).ok_or_else(|| err_room_not_found(&code))?;
                let recipients: Vec<SessionId> = room.core.players().iter().map(|p| p.session_id.clone()).collect();
                let events = match msg_type {
                    "fps_move" => {
                        vec![actions::handle_move(room, &session_id, field_f64(&payload, "x")?, field_f64(&payload, "y")?, field_f64(&payload, "z")?)?]
                    }
                    "fps_shoot" => {
                        let target = SessionId(field_str(&payload, "target")?.to_string());
                        actions::handle_shoot(room, &session_id, &target)?
                    }
                    "fps_chat" => vec![actions::handle_chat(&session_id, field_str(&payload, "text")?.to_string())],
                    _ => unreachable!(),
                };
                drop(rooms);
                for event in events {
                    self.broadcaster.broadcast_to(&recipients, event.to_json().to_string(), None).await;
                }
                Ok(())
            }
            other => Err(ServerError::unknown_type(format!("unknown arena message type `{other}`"))),
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

    fn manager() -> ArenaManager {
        ArenaManager::new(Arc::new(NullBroadcaster))
    }

    #[tokio::test]
    async fn create_then_join_then_start_requires_ready_players() {
        let manager = manager();
        let host = SessionId("h".into());
        let code = manager.create_room(host.clone(), "room".into(), "Host".into()).await.unwrap();
        let guest = SessionId("g".into());
        manager.join_room(&code, guest.clone(), "Guest".into()).await.unwrap();

        assert!(manager.start_game(&code, &host).await.is_err());

        manager.set_ready(&code, &guest, true).await.unwrap();
        manager.start_game(&code, &host).await.unwrap();

        let rooms = manager.rooms.lock().await;
        assert_eq!(rooms.get(&code).unwrap().core.status, RoomStatus::Playing);
    }

    #[tokio::test]
    async fn unknown_message_type_is_rejected() {
        let manager = manager();
        let err = manager.handle(SessionId("h".into()), "fps_not_a_real_type", serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.code, "UNKNOWN_TYPE");
    }
}
