//! Tuning constants for the voxel FPS arena mode (§2, §6 `fps_*`/`arena_*`/`ms_*`).

pub const TICK_RATE_HZ: u32 = 20;

pub const ARENA_WIDTH: i32 = 64;
pub const ARENA_HEIGHT: i32 = 64;

pub const MAX_PLAYERS: u16 = 10;
pub const MIN_PLAYERS_TO_START: usize = 2;
pub const COUNTDOWN_SECONDS: u32 = 5;

pub const STARTING_HEALTH: i32 = 100;
pub const SHOT_DAMAGE: i32 = 25;
pub const SHOT_RANGE: i32 = 40;
pub const RESPAWN_TICKS: u64 = TICK_RATE_HZ as u64 * 3;
pub const KILL_SCORE_LIMIT: i64 = 15;

pub const COLOR_PALETTE_LEN: u8 = 8;
