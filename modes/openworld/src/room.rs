//! Open-world room state: [`RoomCore`] plus the persistent chunked voxel world (§3
//! "Chunked Voxel World", §4.3).

use protocol::{RoomCode, SessionId};
use server_core::RoomCore;
use sim_core::chunked::{ChunkedWorld, FlatGenerator};

use crate::constants::{COLOR_PALETTE_LEN, GRASS_BLOCK_ID, STONE_BLOCK_ID};
use crate::player::OpenWorldPlayer;

pub struct OpenWorldRoom {
    pub core: RoomCore<OpenWorldPlayer>,
    pub world: ChunkedWorld,
}

impl OpenWorldRoom {
    pub fn new(code: RoomCode, name: String, host: SessionId, max_players: u16, seed: u32) -> Self {
        let world = ChunkedWorld::new(
            seed,
            Box::new(FlatGenerator { surface_height: 64, surface_block: GRASS_BLOCK_ID, subsurface_block: STONE_BLOCK_ID }),
        );
        let mut core = RoomCore::new(code, name, host, max_players);
        core.seed = seed;
        OpenWorldRoom { core, world }
    }

    /// Deterministic spawn point found by spiraling outward from world center (§4.3).
    pub fn spawn_point(&mut self) -> (i32, i32, i32) {
        self.world.find_spawn_point(0, 0, crate::constants::LIQUID_BLOCK_IDS)
    }

    pub fn next_color_slot(&self) -> u8 {
        self.core.next_color_slot(COLOR_PALETTE_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_point_lands_on_solid_ground() {
        let mut room = OpenWorldRoom::new(RoomCode("ABCDE".into()), "r".into(), SessionId("h".into()), 8, 1);
        let (x, y, z) = room.spawn_point();
        assert_eq!(room.world.get_block(x, y - 1, z), GRASS_BLOCK_ID);
        assert_eq!(room.world.get_block(x, y, z), crate::constants::AIR_BLOCK_ID);
    }
}
