//! Authoritative simulation primitives shared by every game mode crate: the
//! deterministic PRNG and noise field (C1), the static content registry (C2), the 2D
//! tile grid and chunked voxel world (C3), and the cross-mode effect queue (C13). Has
//! no networking dependency so mode crates can unit test simulation logic without a
//! runtime.

pub mod chunked;
pub mod effects;
pub mod grid;
pub mod registry;
pub mod rng;

pub use chunked::{Chunk, ChunkGenerator, ChunkedWorld, FlatGenerator};
pub use effects::{ActiveEffect, CrossModeEffect, EffectQueue};
pub use grid::{Grid, Tile};
pub use registry::{BlockProps, ContentRegistry, InventoryQuery, ItemProps, MobStats, Recipe};
pub use rng::{Perlin, Rng};
