//! The rhythm Room Manager (§4.8, §4.14): owns every rhythm room plus the ranked
//! matchmaking queue, and implements [`server_core::ModeRouter`] for the untagged
//! (no-prefix) message namespace (§4.7 tag-prefix routing: "others → rhythm manager").

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use protocol::{RoomCode, ServerError, SessionId};
use serde_json::Value;
use server_core::lobby::{MatchmakingQueue, QueuedPlayer};
use server_core::room::{draw_game_seed, draw_unique_room_code, err_game_in_progress, err_not_host, err_room_full, err_room_not_found};
use server_core::{Broadcaster, ModePlayer, ModeRouter, RoomStatus};
use tokio::sync::Mutex;

use crate::actions;
use crate::constants::{MAX_PLAYERS, MIN_PLAYERS_TO_START, POINT_RANGE, QUEUE_TIMEOUT_SECS};
use crate::events::MatchmakingEvent;
use crate::player::RhythmPlayer;
use crate::room::RhythmRoom;
use crate::tick::step;

pub struct RhythmManager {
    rooms: Mutex<HashMap<RoomCode, RhythmRoom>>,
    queue: Mutex<MatchmakingQueue>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl RhythmManager {
    pub fn new(broadcaster: Arc<dyn Broadcaster>) -> Self {
        RhythmManager { rooms: Mutex::new(HashMap::new()), queue: Mutex::new(MatchmakingQueue::new()), broadcaster }
    }

    pub async fn create_room(&self, host: SessionId, name: String, display_name: String) -> Result<RoomCode, ServerError> {
        let mut rooms = self.rooms.lock().await;
        let code = draw_unique_room_code(&|c| rooms.contains_key(c));
        let seed = draw_game_seed();
        let mut room = RhythmRoom::new(code.clone(), name, host.clone(), MAX_PLAYERS, seed);
        let slot = room.next_color_slot();
        room.core.insert_player(RhythmPlayer::new(host, display_name, slot));
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
        room.core.insert_player(RhythmPlayer::new(session_id, display_name, slot));
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
            return Err(ServerError::state("NOT_READY", "not all players are ready"));
        }
        room.core.seed = draw_game_seed();
        room.core.status = RoomStatus::Playing;
        room.core.tick = 0;
        room.next_note_index = 0;
        for player in room.core.players_mut() {
            player.reset_for_game_start();
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

    /// Enqueues a player for ranked matchmaking, attempting an immediate match
    /// (§4.14 "on enqueue: immediate match attempt").
    pub async fn enqueue_ranked(&self, session_id: SessionId, name: String, points: i32) -> Result<(), ServerError> {
        {
            let mut queue = self.queue.lock().await;
            queue.enqueue(QueuedPlayer::new(session_id, name, Some(points)));
        }
        self.try_match().await;
        Ok(())
    }

    pub async fn dequeue_ranked(&self, session_id: &SessionId) {
        self.queue.lock().await.remove(session_id);
    }

    async fn try_match(&self) {
        let matched = self.queue.lock().await.find_match(Some(POINT_RANGE));
        if let Some((a, b)) = matched {
            self.form_match(a, b, false).await;
        }
    }

    /// §4.14, scenario 6: evicts players who've waited past `QUEUE_TIMEOUT_SECS` and
    /// pairs each with an AI opponent.
    pub async fn tick_matchmaking(&self) {
        self.try_match().await;
        let timed_out = self.queue.lock().await.evict_timed_out(Duration::from_secs(QUEUE_TIMEOUT_SECS));
        for player in timed_out {
            let ai = QueuedPlayer::new(SessionId(format!("ai-{}", player.session_id)), "AI Opponent".into(), player.points);
            self.form_match(player, ai, true).await;
        }
    }

    async fn form_match(&self, a: QueuedPlayer, b: QueuedPlayer, is_ai: bool) {
        let code = self.create_room(a.session_id.clone(), format!("ranked-{}", a.session_id), a.name).await.unwrap();
        if !is_ai {
            let _ = self.join_room(&code, b.session_id.clone(), b.name.clone()).await;
        } else {
            let mut rooms = self.rooms.lock().await;
            if let Some(room) = rooms.get_mut(&code) {
                let slot = room.next_color_slot();
                let mut ai_player = RhythmPlayer::new(b.session_id.clone(), b.name.clone(), slot);
                ai_player.is_ai = true;
                ai_player.set_ready(true);
                room.core.insert_player(ai_player);
            }
        }
        let seed = self.rooms.lock().await.get(&code).map(|r| r.core.seed).unwrap_or(0);
        let event = MatchmakingEvent::RankedMatchFound { code: code.0.clone(), is_ai, game_seed: seed };
        self.broadcaster.send_to_player(&a.session_id, event.to_json().to_string()).await;
        if !is_ai {
            self.broadcaster.send_to_player(&b.session_id, event.to_json().to_string()).await;
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
impl ModeRouter for RhythmManager {
    async fn handle(&self, session_id: SessionId, msg_type: &str, payload: Value) -> Result<(), ServerError> {
        match msg_type {
            "create_room" => {
                let name = field_str(&payload, "name")?.to_string();
                let display_name = field_str(&payload, "displayName")?.to_string();
                self.create_room(session_id, name, display_name).await?;
                Ok(())
            }
            "join_room" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let display_name = field_str(&payload, "displayName")?.to_string();
                self.join_room(&code, session_id, display_name).await
            }
            "ready" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let ready = payload.get("ready").and_then(Value::as_bool).unwrap_or(true);
                self.set_ready(&code, &session_id, ready).await
            }
            "start" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                self.start_game(&code, &session_id).await
            }
            "leave" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                self.remove_player(&code, &session_id).await
            }
            "queue_ranked" => {
                let name = field_str(&payload, "name")?.to_string();
                let points = field_i32(&payload, "points")?;
                self.enqueue_ranked(session_id, name, points).await
            }
            "cancel_queue" => {
                self.dequeue_ranked(&session_id).await;
                Ok(())
            }
            "hit_note" | "chat" => {
                let code = RoomCode(field_str(&payload, "code")?.to_string());
                let mut rooms = self.rooms.lock().await;
                let room = rooms.get_mut(&code).ok_or_else(|| err_room_not_found(&code))?;
                let recipients: Vec<SessionId> = room.core.players().iter().map(|p| p.session_id.clone()).collect();
                let event = match msg_type {
                    "hit_note" => actions::handle_hit_note(room, &session_id)?,
                    "chat" => actions::handle_chat(&session_id, field_str(&payload, "text")?.to_string()),
                    _ => unreachable!(),
                };
                drop(rooms);
                self.broadcaster.broadcast_to(&recipients, event.to_json().to_string(), None).await;
                Ok(())
            }
            other => Err(ServerError::unknown_type(format!("unknown rhythm message type `{other}`"))),
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

    fn manager() -> RhythmManager {
        RhythmManager::new(Arc::new(NullBroadcaster))
    }

    #[tokio::test]
    async fn ranked_queue_matches_players_within_point_range() {
        let manager = manager();
        manager.enqueue_ranked(SessionId("a".into()), "A".into(), 1000).await.unwrap();
        manager.enqueue_ranked(SessionId("b".into()), "B".into(), 1050).await.unwrap();
        assert!(manager.queue.lock().await.is_empty());
        assert_eq!(manager.rooms.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn ranked_queue_timeout_forms_an_ai_match() {
        let manager = manager();
        manager.enqueue_ranked(SessionId("solo".into()), "Solo".into(), 1000).await.unwrap();
        {
            let mut queue = manager.queue.lock().await;
            for p in queue.evict_timed_out(Duration::from_secs(0)).into_iter().rev() {
                queue.enqueue(QueuedPlayer { queued_at_millis: 0, ..p });
            }
        }
        manager.tick_matchmaking().await;
        assert!(manager.queue.lock().await.is_empty());
        assert_eq!(manager.rooms.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_message_type_is_rejected() {
        let manager = manager();
        let err = manager.handle(SessionId("h".into()), "not_a_real_type", serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.code, "UNKNOWN_TYPE");
    }
}
