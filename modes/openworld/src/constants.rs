//! Tuning constants for the shared open-world voxel mode (§4.9, §3 "Chunked Voxel
//! World").

pub const TICK_RATE_HZ: u32 = 20;

pub const COLOR_PALETTE_LEN: u8 = 8;
pub const MAX_PLAYERS: u16 = 40;
pub const MIN_PLAYERS_TO_START: usize = 1;
pub const COUNTDOWN_SECONDS: u32 = 3;

pub const STARTING_HEALTH: i32 = 20;
pub const AIR_BLOCK_ID: u16 = 0;
pub const STONE_BLOCK_ID: u16 = 1;
pub const GRASS_BLOCK_ID: u16 = 2;
pub const WATER_BLOCK_ID: u16 = 3;
/// §4.3 `FindSpawnPoint`: liquid block ids excluded from "solid non-liquid" checks.
pub const LIQUID_BLOCK_IDS: &[u16] = &[WATER_BLOCK_ID];

pub const STATE_UPDATE_INTERVAL_TICKS: u64 = TICK_RATE_HZ as u64 / 2;
/// §4.3/§4.12: L1 vision radius plus the documented `+2` pop-in slack, applied over
/// the X/Z plane (Y is unculled — players see the full vertical column near them).
pub const VISION_RADIUS: i32 = 24;
