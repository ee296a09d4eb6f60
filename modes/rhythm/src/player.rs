//! Rhythm player state (§3 Mode Player State): score, combo, and judged note counts.

use protocol::SessionId;
use server_core::ModePlayer;

#[derive(Debug, Clone)]
pub struct RhythmPlayer {
    pub session_id: SessionId,
    pub display_name: String,
    pub ready: bool,
    pub connected: bool,
    pub color_slot: u8,
    pub score: i64,
    pub combo: u32,
    pub notes_hit: u32,
    pub notes_missed: u32,
    pub next_unjudged_index: u32,
    pub is_ai: bool,
}

impl RhythmPlayer {
    pub fn new(session_id: SessionId, display_name: String, color_slot: u8) -> Self {
        RhythmPlayer {
            session_id,
            display_name,
            ready: false,
            connected: true,
            color_slot,
            score: 0,
            combo: 0,
            notes_hit: 0,
            notes_missed: 0,
            next_unjudged_index: 0,
            is_ai: false,
        }
    }

    pub fn reset_for_game_start(&mut self) {
        self.score = 0;
        self.combo = 0;
        self.notes_hit = 0;
        self.notes_missed = 0;
        self.next_unjudged_index = 0;
    }
}

impl ModePlayer for RhythmPlayer {
    fn session_id(&self) -> &SessionId {
        &self.session_id
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
        self.color_slot
    }
}
