//! The rhythm/arena Room Manager (§2, §4.7, §4.14): the untagged message namespace,
//! a fixed note chart judged per-player, and the ranked matchmaking queue with an
//! AI-opponent timeout fallback.

pub mod actions;
pub mod constants;
pub mod events;
pub mod manager;
pub mod player;
pub mod room;
pub mod tick;

pub use manager::RhythmManager;
pub use player::RhythmPlayer;
pub use room::RhythmRoom;
