//! C4: shared Room Manager lifecycle helpers (§3 invariants I1–I5, §4.8 common
//! operations). Each mode crate owns its own `HashMap<RoomCode, Room<Player>>` behind
//! a `tokio::sync::Mutex` (mirroring the teacher's single `AppState { rooms: Mutex<...> }`)
//! and builds its mode-specific `Room` on top of [`RoomCore`]; this module factors out
//! the invariants that are identical across every mode.

use std::time::{SystemTime, UNIX_EPOCH};

use protocol::{RoomCode, ServerError, SessionId, ROOM_CODE_ALPHABET, ROOM_CODE_LEN};
use rand::Rng as _;

/// Room lifecycle status (§3, §4.10 state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Waiting,
    Countdown,
    Playing,
    Finished,
}

/// The mode-specific player state every Room Manager stores alongside the common
/// fields (§3 Mode Player State): session id, display name, ready flag, connected
/// flag, color slot are universal; everything else is mode-specific and lives on the
/// implementing type.
pub trait ModePlayer {
    fn session_id(&self) -> &SessionId;
    fn set_ready(&mut self, ready: bool);
    fn is_ready(&self) -> bool;
    fn set_connected(&mut self, connected: bool);
    fn is_connected(&self) -> bool;
    fn color_slot(&self) -> u8;
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Draws a 5-character room code from the ambiguity-excluding alphabet (§3, B1).
pub fn draw_room_code() -> RoomCode {
    let mut rng = rand::thread_rng();
    let code: String = (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect();
    RoomCode(code)
}

/// Draws a room code that does not already appear in `existing`, by repeated draw
/// until unique (§4.8 `CreateRoom`).
pub fn draw_unique_room_code(existing: &impl Fn(&RoomCode) -> bool) -> RoomCode {
    loop {
        let code = draw_room_code();
        if !existing(&code) {
            return code;
        }
    }
}

/// Draws a 31-bit non-negative game seed (§4.8 `StartGame`).
pub fn draw_game_seed() -> u32 {
    rand::thread_rng().gen_range(0..=0x7FFF_FFFFu32)
}

/// Common room bookkeeping shared by every mode (§3, §4.8). Mode crates embed this and
/// add their own simulation state (world, entities, timers) alongside `players`.
pub struct RoomCore<P: ModePlayer> {
    pub code: RoomCode,
    pub name: String,
    pub host: SessionId,
    pub status: RoomStatus,
    pub created_at_millis: u64,
    pub max_players: u16,
    pub seed: u32,
    /// Room-local simulation time source; monotonic while `status == Playing` (I5).
    pub tick: u64,
    players: Vec<P>,
    /// Join order, oldest first, used to promote a new host when the current host
    /// leaves (I1).
    join_order: Vec<SessionId>,
}

impl<P: ModePlayer> RoomCore<P> {
    pub fn new(code: RoomCode, name: String, host: SessionId, max_players: u16) -> Self {
        RoomCore {
            code,
            name,
            host,
            status: RoomStatus::Waiting,
            created_at_millis: now_millis(),
            max_players,
            seed: 0,
            tick: 0,
            players: Vec::new(),
            join_order: Vec::new(),
        }
    }

    pub fn players(&self) -> &[P] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [P] {
        &mut self.players
    }

    pub fn player(&self, session_id: &SessionId) -> Option<&P> {
        self.players.iter().find(|p| p.session_id() == session_id)
    }

    pub fn player_mut(&mut self, session_id: &SessionId) -> Option<&mut P> {
        self.players.iter_mut().find(|p| p.session_id() == session_id)
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.player(session_id).is_some()
    }

    pub fn is_full(&self) -> bool {
        self.max_players != 0 && self.players.len() as u16 >= self.max_players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Round-robin color slot assignment modulo the palette length (§4.8 `JoinRoom`).
    pub fn next_color_slot(&self, palette_len: u8) -> u8 {
        (self.players.len() as u8) % palette_len.max(1)
    }

    /// Inserts a new player, recording join order for host succession (I1).
    pub fn insert_player(&mut self, player: P) {
        self.join_order.push(player.session_id().clone());
        self.players.push(player);
    }

    /// Removes a player. If the host left, promotes the oldest remaining player (I1).
    /// Returns the removed player, if present.
    pub fn remove_player(&mut self, session_id: &SessionId) -> Option<P> {
        let idx = self.players.iter().position(|p| p.session_id() == session_id)?;
        let removed = self.players.remove(idx);
        self.join_order.retain(|s| s != session_id);

        if &self.host == session_id {
            if let Some(next_host) = self.join_order.first() {
                self.host = next_host.clone();
            }
        }
        Some(removed)
    }

    pub fn connected_players(&self) -> impl Iterator<Item = &P> {
        self.players.iter().filter(|p| p.is_connected())
    }

    /// `StartGame` precondition (§4.8): all non-host connected players ready.
    pub fn all_non_host_ready(&self) -> bool {
        self.players
            .iter()
            .filter(|p| p.session_id() != &self.host && p.is_connected())
            .all(|p| p.is_ready())
    }

    pub fn is_host(&self, session_id: &SessionId) -> bool {
        &self.host == session_id
    }
}

/// §7 error-kind convenience constructors used by every mode's join/start path, kept
/// here so mode crates don't re-derive the same wire codes.
pub fn err_room_not_found(code: &RoomCode) -> ServerError {
    ServerError::room_not_found(format!("room {code} does not exist"))
}

pub fn err_room_full(code: &RoomCode) -> ServerError {
    ServerError::exhausted("ROOM_FULL", format!("room {code} is full"))
}

pub fn err_game_in_progress(code: &RoomCode) -> ServerError {
    ServerError::state("GAME_IN_PROGRESS", format!("room {code} already has a game in progress"))
}

pub fn err_not_host(session_id: &SessionId) -> ServerError {
    ServerError::authorization("NOT_HOST", format!("session {session_id} is not the room host"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct FakePlayer {
        sid: SessionId,
        ready: bool,
        connected: bool,
    }

    impl ModePlayer for FakePlayer {
        fn session_id(&self) -> &SessionId {
            &self.sid
        }
        fn set_ready(&mut self, ready: bool) {
            self.ready = ready;
        }
        fn is_ready(&self) -> bool {
            self.ready
        }
        fn set_connected(&mut self, connected: bool) {
            self.connected = connected;
        }
        fn is_connected(&self) -> bool {
            self.connected
        }
        fn color_slot(&self) -> u8 {
            0
        }
    }

    fn player(id: &str) -> FakePlayer {
        FakePlayer { sid: SessionId(id.to_string()), ready: false, connected: true }
    }

    #[test]
    fn host_succession_picks_oldest_remaining() {
        let mut room = RoomCore::new(RoomCode("ABCDE".into()), "room".into(), SessionId("h".into()), 4);
        room.insert_player(player("h"));
        room.insert_player(player("a"));
        room.insert_player(player("b"));
        room.remove_player(&SessionId("h".into()));
        assert_eq!(room.host, SessionId("a".into()));
    }

    #[test]
    fn room_with_zero_players_reports_empty() {
        let mut room = RoomCore::new(RoomCode("ABCDE".into()), "room".into(), SessionId("h".into()), 4);
        room.insert_player(player("h"));
        assert!(!room.is_empty());
        room.remove_player(&SessionId("h".into()));
        assert!(room.is_empty());
    }

    #[test]
    fn join_leave_restores_pre_join_player_set() {
        let mut room = RoomCore::new(RoomCode("ABCDE".into()), "room".into(), SessionId("h".into()), 4);
        room.insert_player(player("h"));
        let before: Vec<_> = room.players().iter().map(|p| p.sid.clone()).collect();
        room.insert_player(player("p"));
        room.remove_player(&SessionId("p".into()));
        let after: Vec<_> = room.players().iter().map(|p| p.sid.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn ready_check_ignores_disconnected_non_host_players() {
        let mut room = RoomCore::new(RoomCode("ABCDE".into()), "room".into(), SessionId("h".into()), 4);
        room.insert_player(player("h"));
        let mut p = player("p");
        p.connected = false;
        room.insert_player(p);
        assert!(room.all_non_host_ready());
    }

    #[test]
    fn full_room_respects_zero_as_unlimited() {
        let mut room = RoomCore::new(RoomCode("ABCDE".into()), "room".into(), SessionId("h".into()), 0);
        room.insert_player(player("h"));
        assert!(!room.is_full());
    }

    #[test]
    fn room_codes_stay_within_alphabet_and_length() {
        for _ in 0..10_000 {
            let code = draw_room_code();
            assert_eq!(code.0.len(), ROOM_CODE_LEN);
            assert!(code.0.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b)));
        }
    }
}
