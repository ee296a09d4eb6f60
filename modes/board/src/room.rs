//! Board room state: [`RoomCore`] plus the board-specific simulation world (§3, §4.10).

use std::sync::Arc;

use protocol::{RoomCode, SessionId};
use server_core::{RoomCore, RoomStatus};
use sim_core::grid::{Grid, Tile};
use sim_core::registry::ContentRegistry;
use sim_core::rng::Rng;

use crate::constants::{COLOR_PALETTE_LEN, GRID_HEIGHT, GRID_WIDTH};
use crate::entities::{Anomaly, BoardSide, CorruptionNode, Mob, RaidMob};
use crate::player::BoardPlayer;

pub fn default_tile() -> Tile {
    Tile { block_id: "grass".into(), biome: "plains".into() }
}

pub struct BoardRoom {
    pub core: RoomCore<BoardPlayer>,
    pub registry: Arc<ContentRegistry>,
    pub grid: Grid,
    pub mobs: Vec<Mob>,
    pub raid_mobs: Vec<RaidMob>,
    pub corruption: Vec<CorruptionNode>,
    pub anomalies: Vec<Anomaly>,
    /// Monotonic day-cycle counter (I5); normalized to `[0,1)` only at serialization
    /// time, per the resolved open question on `timeOfDay`.
    pub time_of_day_ticks: u64,
    pub next_mob_id: u64,
}

impl BoardRoom {
    pub fn new(
        code: RoomCode,
        name: String,
        host: SessionId,
        max_players: u16,
        registry: Arc<ContentRegistry>,
    ) -> Self {
        BoardRoom {
            core: RoomCore::new(code, name, host, max_players),
            registry,
            grid: Grid::new(GRID_WIDTH, GRID_HEIGHT, default_tile()),
            mobs: Vec::new(),
            raid_mobs: Vec::new(),
            corruption: Vec::new(),
            anomalies: Vec::new(),
            time_of_day_ticks: 0,
            next_mob_id: 0,
        }
    }

    pub fn next_mob_id(&mut self) -> u64 {
        let id = self.next_mob_id;
        self.next_mob_id += 1;
        id
    }

    /// Deterministic spawn slot for the `n`-th joined player, scattered around the
    /// grid center by a seeded offset so players don't stack on the same tile.
    pub fn spawn_point(&self, slot_index: u32) -> (i32, i32) {
        let mut rng = Rng::for_cell(self.core.seed, 0, slot_index as u64);
        let cx = self.grid.width() / 2;
        let cy = self.grid.height() / 2;
        let dx = rng.next_int(-3, 3) as i32;
        let dy = rng.next_int(-3, 3) as i32;
        let (x, y) = (cx + dx, cy + dy);
        (x.clamp(0, self.grid.width() - 1), y.clamp(0, self.grid.height() - 1))
    }

    pub fn next_color_slot(&self) -> u8 {
        self.core.next_color_slot(COLOR_PALETTE_LEN)
    }

    pub fn is_playing(&self) -> bool {
        self.core.status == RoomStatus::Playing
    }

    pub fn corruption_on(&self, side: BoardSide) -> impl Iterator<Item = &CorruptionNode> {
        self.corruption.iter().filter(move |n| n.side == side)
    }

    pub fn anomaly_on(&self, side: BoardSide) -> Option<&Anomaly> {
        self.anomalies.iter().find(|a| a.side == side)
    }

    pub fn anomaly_on_mut(&mut self, side: BoardSide) -> Option<&mut Anomaly> {
        self.anomalies.iter_mut().find(|a| a.side == side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> BoardRoom {
        BoardRoom::new(
            RoomCode("ABCDE".into()),
            "room".into(),
            SessionId("h".into()),
            8,
            Arc::new(ContentRegistry::default()),
        )
    }

    #[test]
    fn spawn_point_stays_within_grid_bounds() {
        let room = room();
        for i in 0..20 {
            let (x, y) = room.spawn_point(i);
            assert!(room.grid.in_bounds(x, y));
        }
    }

    #[test]
    fn spawn_point_is_deterministic_for_same_slot() {
        let room = room();
        assert_eq!(room.spawn_point(3), room.spawn_point(3));
    }

    #[test]
    fn color_slots_cycle_through_palette() {
        let mut room = room();
        for i in 0..(COLOR_PALETTE_LEN as u32 + 2) {
            let slot = room.next_color_slot();
            assert!(slot < COLOR_PALETTE_LEN);
            room.core.insert_player(BoardPlayer::new(
                SessionId(format!("p{i}")),
                format!("P{i}"),
                slot,
                (0, 0),
            ));
        }
    }
}
