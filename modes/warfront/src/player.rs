//! Warfront player state: role, team, position, and combat accumulators (§3, §4.11).

use protocol::SessionId;
use server_core::ModePlayer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Defender,
    Soldier,
    Engineer,
    Commander,
}

#[derive(Debug, Clone)]
pub struct WarfrontPlayer {
    pub session_id: SessionId,
    pub display_name: String,
    pub ready: bool,
    pub connected: bool,
    pub color_slot: u8,
    pub team_id: String,
    pub role: Role,
    pub x: i32,
    pub y: i32,
    pub current_cell_id: Option<usize>,
    pub health: i32,
    pub damage_dealt: i64,
    pub kills: u32,
    pub deaths: u32,
}

impl WarfrontPlayer {
    pub fn new(session_id: SessionId, display_name: String, color_slot: u8, team_id: String, role: Role) -> Self {
        WarfrontPlayer {
            session_id,
            display_name,
            ready: false,
            connected: true,
            color_slot,
            team_id,
            role,
            x: 0,
            y: 0,
            current_cell_id: None,
            health: 100,
            damage_dealt: 0,
            kills: 0,
            deaths: 0,
        }
    }
}

impl ModePlayer for WarfrontPlayer {
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
