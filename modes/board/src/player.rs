//! Board player state (§3 Mode Player State, §4.10).

use std::collections::HashMap;

use protocol::SessionId;
use server_core::ModePlayer;

use crate::constants::{MAX_HUNGER, STARTING_HEALTH, STARTING_HUNGER};

#[derive(Debug, Clone)]
pub struct MiningJob {
    pub x: i32,
    pub y: i32,
    pub block_id: String,
    pub ticks_total: u32,
    pub ticks_remaining: u32,
}

#[derive(Debug, Clone)]
pub struct BoardPlayer {
    pub session_id: SessionId,
    pub display_name: String,
    pub ready: bool,
    pub connected: bool,
    pub color_slot: u8,
    pub x: i32,
    pub y: i32,
    pub health: i32,
    pub hunger: i32,
    pub dead: bool,
    pub respawn_tick: u64,
    pub armor: i32,
    pub tool_tier: u8,
    pub equipped_tool_type: Option<sim_core::registry::ToolType>,
    pub equipped_damage: u32,
    pub mining_speed: f64,
    pub inventory: HashMap<String, u32>,
    pub mining: Option<MiningJob>,
    pub blocks_mined: u64,
    pub last_move_tick: u64,
    pub last_attack_tick: u64,
}

impl BoardPlayer {
    pub fn new(session_id: SessionId, display_name: String, color_slot: u8, spawn: (i32, i32)) -> Self {
        BoardPlayer {
            session_id,
            display_name,
            ready: false,
            connected: true,
            color_slot,
            x: spawn.0,
            y: spawn.1,
            health: STARTING_HEALTH,
            hunger: STARTING_HUNGER,
            dead: false,
            respawn_tick: 0,
            armor: 0,
            tool_tier: 0,
            equipped_tool_type: None,
            equipped_damage: 1,
            mining_speed: 1.0,
            inventory: HashMap::new(),
            mining: None,
            blocks_mined: 0,
            last_move_tick: 0,
            last_attack_tick: 0,
        }
    }

    /// Resets transient combat/position state for a new game (§4.8 `BeginPlaying`).
    pub fn reset_for_game_start(&mut self, spawn: (i32, i32)) {
        self.x = spawn.0;
        self.y = spawn.1;
        self.health = STARTING_HEALTH;
        self.hunger = STARTING_HUNGER;
        self.dead = false;
        self.respawn_tick = 0;
        self.mining = None;
        self.blocks_mined = 0;
    }

    pub fn add_item(&mut self, item_id: &str, count: u32) {
        *self.inventory.entry(item_id.to_string()).or_insert(0) += count;
    }

    pub fn feed(&mut self, amount: i32) {
        self.hunger = (self.hunger + amount).min(MAX_HUNGER);
    }
}

impl ModePlayer for BoardPlayer {
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
