//! Tuning constants for the territory-control tick pipeline (§4.9, §4.11).

pub const TICK_RATE_HZ: u32 = 15;

pub const GRID_SIZE: i32 = 4;
pub const CELL_COUNT: usize = (GRID_SIZE * GRID_SIZE) as usize;

pub const MAX_PLAYERS: u16 = 16;
pub const MIN_PLAYERS_TO_START: usize = 2;
/// Warfront hard-codes its countdown rather than deferring to a per-mode value
/// (§9 open question resolution, `DESIGN.md`).
pub const COUNTDOWN_SECONDS: u32 = 5;

pub const MAX_HEALTH: i32 = 100;
pub const MAX_FORTIFICATION: u32 = 5;

pub const CAPTURE_RATE: f64 = 0.02;
pub const SLOW_PER_LEVEL: f64 = 0.1;
pub const CAPTURE_THRESHOLD: f64 = 1.0;
pub const RIVAL_PROGRESS_DECAY: f64 = 0.5;

pub const TERRITORY_BROADCAST_INTERVAL: u64 = 10;
pub const RESOURCE_BROADCAST_INTERVAL: u64 = 20;

pub const GAME_DURATION_TICKS: u64 = TICK_RATE_HZ as u64 * 60 * 20;
pub const TEAM_WIN_HOLD_SECONDS: u64 = 30;
pub const FFA_WIN_TERRITORY_COUNT: usize = 6;
pub const TEAM_WIN_FRACTION: f64 = 0.75;

// §4.11 role action semantics.
pub const LINE_CLEAR_HEAL: i32 = 15;
pub const SHIELD_BOOST_DURATION_TICKS: u64 = TICK_RATE_HZ as u64 * 8;
pub const COMBO_MIN_COUNT: u32 = 3;
pub const COMBO_ENERGY_PER_COUNT: i64 = 5;
pub const BUILD_SPEED_DURATION_TICKS: u64 = TICK_RATE_HZ as u64 * 10;
pub const TETRIS_TERRITORY_DAMAGE: i32 = 20;
pub const KILL_TEAM_SCORE_BONUS: i64 = 10;
pub const KILL_TERRITORY_DAMAGE: i32 = 10;
/// Engineer mining-to-resource mapping (block id -> (resource, amount)); §4.11
/// "grants resources by block type per a static mapping".
pub const ENGINEER_MINING_YIELDS: &[(&str, &str, i64)] =
    &[("iron_ore", "iron", 2), ("stone", "stone", 1), ("wood", "wood", 1), ("diamond_ore", "diamond", 1)];
pub const FORTIFICATION_BUFF_LEVELS: u32 = 1;
pub const AMMO_RESUPPLY_DURATION_TICKS: u64 = TICK_RATE_HZ as u64 * 15;
