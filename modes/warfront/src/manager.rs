//! The warfront Room Manager (§4.8 common operations, §4.11 tick pipeline). Owns
//! every warfront room behind one mutex (documented simplification, see
//! `DESIGN.md`) and implements [`server_core::ModeRouter`] so the dispatcher can
//! route `wf_*` frames here directly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use protocol::{RoomCode, ServerError, SessionId};
use serde_json::Value;
use server_core::room::{draw_game_seed, draw_unique_room_code, err_game_in_progress, err_not_host, err_room_full, err_room_not_found};
use server_core::{Broadcaster, ModePlayer, ModeRouter, RoomStatus};
use tokio::sync::Mutex;

use crate::actions;
use crate::constants::{COUNTDOWN_SECONDS, MAX_PLAYERS, MIN_PLAYERS_TO_START};
use crate::player::{Role, WarfrontPlayer};
use crate::room::WarfrontRoom;
use crate::tick::step;

const TEAM_IDS: [&str; 2] = ["alpha", "bravo"];

pub struct WarfrontManager {
    rooms: Mutex<HashMap<RoomCode, WarfrontRoom>>,
    broadcaster: Arc<dyn Broadcaster>,
}

fn role_from_str(s: &str) -> Option<Role> {
    match s {
        "defender" => Some(Role::Defender),
        "soldier" => Some(Role::Soldier),
        "engineer" => Some(Role::Engineer),
        "commander" => Some(Role::Commander),
        _ => None,
    }
}

impl WarfrontManager {
    pub fn new(broadcaster: Arc<dyn Broadcaster>) -> Self {
        WarfrontManager { rooms: Mutex::new(HashMap::new()), broadcaster }
    }

    pub async fn create_room(&self, host: SessionId, name: String, display_name: String, ffa: bool) -> Result<RoomCode, ServerError> {
        let mut rooms = self.rooms.lock().await;
        let code = draw_unique_room_code(&|c| rooms.contains_key(c));
        let mut room = WarfrontRoom::new(code.clone(), name, host.clone(), MAX_PLAYERS, &TEAM_IDS, ffa);
        let slot = room.core.next_color_slot(TEAM_IDS.len() as u8);
        let team = TEAM_IDS[0].to_string();
        room.core.insert_player(WarfrontPlayer::new(host, display_name, slot, team, Role::Soldier));
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
        let slot = room.core.next_color_slot(TEAM_IDS.len() as u8);
        // Balance teams by assigning to whichever team currently has fewer players.
        let alpha_count = room.core.players().iter().filter(|p| p.team_id == TEAM_IDS[0]).count();
        let bravo_count = room.core.players().iter().filter(|p| p.team_id == TEAM_IDS[1]).count();
        let team = if alpha_count <= bravo_count { TEAM_IDS[0] } else { TEAM_IDS[1] };
        room.core.insert_player(WarfrontPlayer::new(session_id, display_name, slot, team.to_string(), Role::Soldier));
        Ok(())
    }

    pub async fn set_ready(&self, code: &RoomCode, session_id: &SessionId, ready: bool) -> Result<(), ServerError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or_else(|| err_room_not_found(code))?;
        let player = room.core.player_mut(session_id).ok_or_else(|| err_room_not_found(code))?;
        player.set_ready(ready);
        Ok(())
    }

    /// `selectRole` (§4.8): only allowed in `waiting`; role switch resets the
    /// role-specific stat accumulators to zero.
    pub async fn select_role(&self, code: &RoomCode, session_id: &SessionId, role: Role) -> Result<(), ServerError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or_else(|| err_room_not_found(code))?;
        if room.core.status != RoomStatus::Waiting {
            return Err(err_game_in_progress(code));
        }
        let player = room.core.player_mut(session_id).ok_or_else(|| err_room_not_found(code))?;
        player.role = role;
        player.damage_dealt = 0;
        player.kills = 0;
        player.deaths = 0;
        Ok(())
    }

    pub async fn select_team(&self, code: &RoomCode, session_id: &SessionId, team_id: String) -> Result<(), ServerError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or_else(|| err_room_not_found(code))?;
        if room.core.status != RoomStatus::Waiting {
            return Err(err_game_in_progress(code));
        }
        if !room.team_ids().contains(&team_id) {
            return Err(ServerError::validation("WF_BAD_TEAM", "unknown team id"));
        }
        let player = room.core.player_mut(session_id).ok_or_else(|| err_room_not_found(code))?;
        player.team_id = team_id;
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
            return Err(ServerError::state("WF_NOT_READY", "not all players are ready"));
        }
        room.core.status = RoomStatus::Countdown;
        room.core.seed = draw_game_seed();
        drop(rooms);
        let _ = COUNTDOWN_SECONDS;
        self.begin_playing(code).await
    }

    async fn begin_playing(&self, code: &RoomCode) -> Result<(), ServerError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(code).ok_or_else(|| err_room_not_found(code))?;
        room.core.status = RoomStatus::Playing;
        for player in room.core.players_mut().iter_mut() {
            player.health = crate::constants::MAX_HEALTH;
            player.current_cell_id = None;
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
    /// Drives every playing warfront room forward one tick and broadcasts resulting
    /// events (§4.9, §4.11).
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
            if outcome.game_over {
                room.core.status = RoomStatus::Finished;
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

fn field_u32(payload: &Value, key: &str) -> Result<u32, ServerError> {
    payload.get(key).and_then(Value::as_u64).map(|v| v as u32).ok_or_else(|| ServerError::invalid_format(format!("missing `{key}` field")))
}

#[async_trait]
impl ModeRouter for WarfrontManager {
    async fn handle(&self, session_id: SessionId, msg_type: &str, payload: Value) -> Result<(), ServerError> {
        match msg_type {
            "wf_create_room" => {
                let name = field_str(&payload, "name")?.to_string();
                let display_name = field_str(&payload, "displayName")?.to_string();
                let ffa = payload.get("ffa").and_then(Value::as_bool).unwrap_or(false);
                self.create_room(session_id, name, display_name, ffa).await?;
                Ok(())
            }
            "wf_join_room" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let display_name = field_str(&payload, "displayName")?.to_string();
                self.join_room(&code, session_id, display_name).await
            }
            "wf_ready" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let ready = payload.get("ready").and_then(Value::as_bool).unwrap_or(true);
                self.set_ready(&code, &session_id, ready).await
            }
            "wf_select_role" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let role = role_from_str(field_str(&payload, "role")?).ok_or_else(|| ServerError::validation("WF_BAD_ROLE", "unknown role"))?;
                self.select_role(&code, &session_id, role).await
            }
            "wf_select_team" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let team_id = field_str(&payload, "teamId")?.to_string();
                self.select_team(&code, &session_id, team_id).await
            }
            "wf_start" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                self.start_game(&code, &session_id).await
            }
            "wf_leave" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                self.remove_player(&code, &session_id).await
            }
            "wf_move"
            | "wf_line_clear"
            | "wf_combo"
            | "wf_t_spin"
            | "wf_tetris"
            | "wf_soldier_hit"
            | "wf_soldier_died"
            | "wf_engineer_mine"
            | "wf_engineer_place"
            | "wf_engineer_craft"
            | "wf_commander_ability"
            | "wf_chat" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let mut rooms = self.rooms.lock().await;
                let room = rooms.get_mut(&code).ok_or_else(|| err_room_not_found(&code))?;
                match msg_type {
                    "wf_move" => {
                        let cell_id = payload.get("cellId").and_then(Value::as_u64).map(|v| v as usize);
                        actions::handle_move(room, &session_id, field_i32(&payload, "x")?, field_i32(&payload, "y")?, cell_id)?;
                    }
                    "wf_line_clear" => {
                        actions::handle_line_clear(room, &session_id, field_u32(&payload, "lines")?)?;
                    }
                    "wf_combo" => {
                        actions::handle_combo(room, &session_id, field_u32(&payload, "comboCount")?)?;
                    }
                    "wf_t_spin" => {
                        actions::handle_t_spin(room, &session_id)?;
                    }
                    "wf_tetris" => {
                        actions::handle_tetris(room, &session_id)?;
                    }
                    "wf_soldier_hit" => {
                        let damage = payload.get("damage").and_then(Value::as_i64).unwrap_or(0);
                        actions::handle_soldier_hit(room, &session_id, damage)?;
                    }
                    "wf_soldier_died" => {
                        let victim = SessionId(field_str(&payload, "victim")?.to_string());
                        actions::handle_soldier_died(room, &session_id, &victim)?;
                    }
                    "wf_engineer_mine" => {
                        actions::handle_engineer_mine(room, &session_id, field_str(&payload, "blockId")?)?;
                    }
                    "wf_engineer_place" => {
                        actions::handle_engineer_place(room, &session_id)?;
                    }
                    "wf_engineer_craft" => {
                        actions::handle_engineer_craft(room, &session_id)?;
                    }
                    "wf_commander_ability" => {
                        let ability = field_str(&payload, "ability")?.to_string();
                        let target_cell = payload.get("targetCell").and_then(Value::as_u64).map(|v| v as usize);
                        let cost: Vec<(String, i64)> = payload
                            .get("cost")
                            .and_then(Value::as_object)
                            .map(|m| m.iter().filter_map(|(k, v)| v.as_i64().map(|n| (k.clone(), n))).collect())
                            .unwrap_or_default();
                        let cost_refs: Vec<(&str, i64)> = cost.iter().map(|(k, v)| (k.as_str(), *v)).collect();
                        actions::handle_commander_ability(room, &session_id, &ability, &cost_refs, target_cell)?;
                    }
                    "wf_chat" => {
                        let _ = actions::handle_chat(&session_id, field_str(&payload, "text")?.to_string());
                    }
                    _ => unreachable!(),
                }
                Ok(())
            }
            other => Err(ServerError::unknown_type(format!("unknown warfront message type `{other}`"))),
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

    fn manager() -> WarfrontManager {
        WarfrontManager::new(Arc::new(NullBroadcaster))
    }

    #[tokio::test]
    async fn create_then_join_balances_teams() {
        let manager = manager();
        let host = SessionId("h".into());
        let code = manager.create_room(host.clone(), "room".into(), "Host".into(), false).await.unwrap();
        let guest = SessionId("g".into());
        manager.join_room(&code, guest.clone(), "Guest".into()).await.unwrap();

        let rooms = manager.rooms.lock().await;
        let room = rooms.get(&code).unwrap();
        assert_eq!(room.core.player(&host).unwrap().team_id, "alpha");
        assert_eq!(room.core.player(&guest).unwrap().team_id, "bravo");
    }

    #[tokio::test]
    async fn start_requires_ready_players() {
        let manager = manager();
        let host = SessionId("h".into());
        let code = manager.create_room(host.clone(), "room".into(), "Host".into(), false).await.unwrap();
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
        let err = manager.handle(SessionId("h".into()), "wf_not_a_real_type", serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.code, "UNKNOWN_TYPE");
    }
}
