//! Tuning constants for the rhythm/arena mode (§2, §6 untagged messages) and its
//! ranked matchmaking queue (§4.14, scenario 6).

pub const TICK_RATE_HZ: u32 = 20;

pub const MAX_PLAYERS: u16 = 2;
pub const MIN_PLAYERS_TO_START: usize = 1;
pub const COUNTDOWN_SECONDS: u32 = 3;

pub const COLOR_PALETTE_LEN: u8 = 8;

/// Notes spawn at a fixed cadence and the chart ends after `CHART_NOTE_COUNT` notes.
pub const NOTE_INTERVAL_TICKS: u64 = TICK_RATE_HZ as u64; // one note per second
pub const CHART_NOTE_COUNT: u32 = 16;

/// Hit-judging windows, in ticks of offset from the expected note tick (§4.14-style
/// timing window, generalized from the teacher's beat-matching judging).
pub const PERFECT_WINDOW_TICKS: u64 = 2;
pub const GOOD_WINDOW_TICKS: u64 = 6;

pub const PERFECT_SCORE: i64 = 100;
pub const GOOD_SCORE: i64 = 50;
pub const MISS_SCORE: i64 = 0;
pub const COMBO_BONUS_PER_STEP: i64 = 5;

/// §4.14 ranked matchmaking.
pub const POINT_RANGE: i32 = 200;
pub const QUEUE_TIMEOUT_SECS: u64 = 20;
