//! The shared open-world voxel Room Manager (§4.9): a persistent chunked world, free
//! movement, mining and placing blocks, and per-player vision-radius snapshots.

pub mod actions;
pub mod constants;
pub mod events;
pub mod manager;
pub mod player;
pub mod room;
pub mod tick;

pub use manager::OpenWorldManager;
pub use player::OpenWorldPlayer;
pub use room::OpenWorldRoom;
