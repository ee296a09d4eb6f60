//! The territory-control Room Manager (§4.11): a role-based cross-mode effect
//! queue, capture progress over a fixed territory grid, per-team resource
//! accounting, and team/FFA win conditions.

pub mod actions;
pub mod constants;
pub mod events;
pub mod manager;
pub mod player;
pub mod room;
pub mod territory;
pub mod tick;

pub use manager::WarfrontManager;
pub use player::WarfrontPlayer;
pub use room::WarfrontRoom;
