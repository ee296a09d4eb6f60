//! Mode-specific timing constants (§4.9, §4.10), mirroring the teacher's inline
//! constants in `lobby.rs`/`hand_shake.rs` (`CHANNEL_BUFFER_SIZE`, buffer sizes, etc.)
//! but scoped to this mode crate rather than shared globally.

pub const TICK_RATE_HZ: u32 = 20;

pub const GRID_WIDTH: i32 = 48;
pub const GRID_HEIGHT: i32 = 48;
pub const VISION_RADIUS: i32 = 10;

pub const MAX_PLAYERS: u16 = 8;
pub const MIN_PLAYERS_TO_START: usize = 1;
pub const COUNTDOWN_SECONDS: u32 = 5;

pub const MOVE_COOLDOWN_TICKS: u64 = 4;
pub const ATTACK_COOLDOWN_TICKS: u64 = 6;

pub const MOB_MOVE_INTERVAL: u64 = 10;
pub const MOB_SPAWN_INTERVAL: u64 = 200;
pub const HUNGER_TICK_INTERVAL: u64 = 400;
pub const HUNGER_DAMAGE_INTERVAL: u64 = 80;
pub const STATE_UPDATE_INTERVAL: u64 = 4;
pub const RESPAWN_TICKS: u64 = 100;

pub const CORRUPTION_SEED_INTERVAL: u64 = 600;
pub const CORRUPTION_GROWTH_INTERVAL: u64 = 300;
pub const CORRUPTION_CAP_PER_SIDE: usize = 6;
pub const MAX_CORRUPTION_LEVEL: u32 = 5;
pub const SPREAD_CHANCE: f64 = 0.15;

pub const RAID_WAVE_SIZE: u32 = 3;
pub const RAID_WAVE_INTERVAL: u64 = 60;
pub const ANOMALY_MAX_WAVES: u32 = 4;
pub const RAID_MOB_MOVE_INTERVAL: u64 = 5;
pub const RAID_MOB_AGGRO_RANGE: i32 = 20;
pub const HOSTILE_AGGRO_RANGE: i32 = 12;
pub const HOSTILE_ATTACK_RANGE: i32 = 1;
pub const HOSTILE_ATTACK_INTERVAL: u64 = 10;
pub const HOSTILE_MOB_DAMAGE: i32 = 4;

pub const DAY_LENGTH_TICKS: u64 = 2400;
pub const DUSK_LENGTH_TICKS: u64 = 200;
pub const NIGHT_LENGTH_TICKS: u64 = 2000;
pub const DAWN_LENGTH_TICKS: u64 = 200;

pub const STARTING_HEALTH: i32 = 20;
pub const STARTING_HUNGER: i32 = 20;
pub const MAX_HUNGER: i32 = 20;

pub const COLOR_PALETTE_LEN: u8 = 8;

/// Biome-appropriate tile left behind by mining (§4.10 step 2): grass biomes expose
/// grass, desert exposes sand, snowy exposes a snow block; anything else falls back
/// to grass.
pub fn exposed_block_for_biome(biome: &str) -> &'static str {
    match biome {
        "desert" => "sand",
        "snowy" => "snow_block",
        _ => "grass",
    }
}
