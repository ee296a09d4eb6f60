//! Arena room state: [`RoomCore`] plus a flat combat arena (§3, §4.3 generalized —
//! there is no persistent chunked world here, only spawn placement).

use protocol::{RoomCode, SessionId};
use server_core::RoomCore;
use sim_core::rng::Rng;

use crate::constants::{ARENA_HEIGHT, ARENA_WIDTH, COLOR_PALETTE_LEN};
use crate::player::ArenaPlayer;

pub struct ArenaRoom {
    pub core: RoomCore<ArenaPlayer>,
}

impl ArenaRoom {
    pub fn new(code: RoomCode, name: String, host: SessionId, max_players: u16, seed: u32) -> Self {
        let mut core = RoomCore::new(code, name, host, max_players);
        core.seed = seed;
        ArenaRoom { core }
    }

    /// Deterministic spawn point derived from the room seed and the joining player's
    /// slot index, mirroring the `Rng::for_cell` pattern used elsewhere (§4.1).
    pub fn spawn_point(&self, slot: u32) -> (f64, f64, f64) {
        let mut rng = Rng::for_cell(self.core.seed, 0, slot as u64);
        let x = rng.next_int(0, ARENA_WIDTH as i64) as f64;
        let z = rng.next_int(0, ARENA_HEIGHT as i64) as f64;
        (x, 0.0, z)
    }

    pub fn next_color_slot(&self) -> u8 {
        self.core.next_color_slot(COLOR_PALETTE_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_point_is_deterministic_for_a_given_seed() {
        let room = ArenaRoom::new(RoomCode("ABCDE".into()), "r".into(), SessionId("h".into()), 8, 42);
        assert_eq!(room.spawn_point(3), room.spawn_point(3));
    }
}
