//! Open-world player state (§3 Mode Player State): voxel position, health, and a
//! flat inventory of block/item counts.

use std::collections::HashMap;

use protocol::SessionId;
use server_core::ModePlayer;

use crate::constants::STARTING_HEALTH;

#[derive(Debug, Clone)]
pub struct OpenWorldPlayer {
    pub session_id: SessionId,
    pub display_name: String,
    pub ready: bool,
    pub connected: bool,
    pub color_slot: u8,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub health: i32,
    pub dead: bool,
    pub inventory: HashMap<u16, u32>,
    pub selected_block: u16,
}

impl OpenWorldPlayer {
    pub fn new(session_id: SessionId, display_name: String, color_slot: u8, spawn: (i32, i32, i32)) -> Self {
        OpenWorldPlayer {
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
            inventory: HashMap::new(),
            selected_block: crate::constants::STONE_BLOCK_ID,
        }
    }

    pub fn reset_for_game_start(&mut self, spawn: (i32, i32, i32)) {
        self.x = spawn.0;
        self.y = spawn.1;
        self.z = spawn.2;
        self.health = STARTING_HEALTH;
        self.dead = false;
    }

    pub fn add_block(&mut self, block_id: u16, count: u32) {
        *self.inventory.entry(block_id).or_insert(0) += count;
    }
}

impl ModePlayer for OpenWorldPlayer {
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
