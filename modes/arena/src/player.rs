//! Arena player state (§3 Mode Player State): position, health, and deathmatch stats.

use protocol::SessionId;
use server_core::ModePlayer;

use crate::constants::STARTING_HEALTH;

#[derive(Debug, Clone)]
pub struct ArenaPlayer {
    pub session_id: SessionId,
    pub display_name: String,
    pub ready: bool,
    pub connected: bool,
    pub color_slot: u8,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub health: i32,
    pub dead: bool,
    pub kills: i64,
    pub deaths: i64,
    pub respawn_at_tick: Option<u64>,
}

impl ArenaPlayer {
    pub fn new(session_id: SessionId, display_name: String, color_slot: u8, spawn: (f64, f64, f64)) -> Self {
        ArenaPlayer {
            session_id,
            display_name,
            ready: false,
            connected: true,
            color_slot,
            x: spawn.0,
            y: spawn.1,
            z: spawn.2,
            health: STARTING_HEALTH,
            dead: false,
            kills: 0,
            deaths: 0,
            respawn_at_tick: None,
        }
    }

    pub fn reset_for_game_start(&mut self, spawn: (f64, f64, f64)) {
        self.x = spawn.0;
        self.y = spawn.1;
        self.z = spawn.2;
        self.health = STARTING_HEALTH;
        self.dead = false;
        self.kills = 0;
        self.deaths = 0;
        self.respawn_at_tick = None;
    }
}

impl ModePlayer for ArenaPlayer {
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
