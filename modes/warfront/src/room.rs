//! Warfront room state: [`RoomCore`] plus the territory grid, per-team resources,
//! and the cross-mode effect queue (§3, §4.11).

use std::collections::HashMap;

use protocol::{RoomCode, SessionId};
use server_core::RoomCore;
use sim_core::effects::EffectQueue;

use crate::constants::CELL_COUNT;
use crate::player::WarfrontPlayer;
use crate::territory::{build_grid, ResourcePool, TerritoryCell};

pub struct WarfrontRoom {
    pub core: RoomCore<WarfrontPlayer>,
    pub cells: Vec<TerritoryCell>,
    pub resources: HashMap<String, ResourcePool>,
    pub effects: EffectQueue,
    pub ffa: bool,
    /// Team currently meeting the hold-threshold, and how many consecutive ticks
    /// it has held it (§4.11 step 6: "30 continuous wall-seconds").
    pub holding_team: Option<String>,
    pub hold_streak_ticks: u64,
    pub winner: Option<String>,
}

impl WarfrontRoom {
    pub fn new(code: RoomCode, name: String, host: SessionId, max_players: u16, team_ids: &[&str], ffa: bool) -> Self {
        let mut resources = HashMap::new();
        for team in team_ids {
            resources.insert(team.to_string(), ResourcePool::default());
        }
        WarfrontRoom {
            core: RoomCore::new(code, name, host, max_players),
            cells: build_grid(),
            resources,
            effects: EffectQueue::new(),
            ffa,
            holding_team: None,
            hold_streak_ticks: 0,
            winner: None,
        }
    }

    pub fn cell_mut(&mut self, id: usize) -> Option<&mut TerritoryCell> {
        self.cells.get_mut(id)
    }

    pub fn cell(&self, id: usize) -> Option<&TerritoryCell> {
        self.cells.get(id)
    }

    pub fn territory_count(&self, team_id: &str) -> usize {
        self.cells.iter().filter(|c| c.owner.as_deref() == Some(team_id)).count()
    }

    pub fn team_ids(&self) -> Vec<String> {
        self.resources.keys().cloned().collect()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

pub const DEFAULT_CELL_COUNT: usize = CELL_COUNT;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn territory_count_reflects_ownership() {
        let mut room = WarfrontRoom::new(RoomCode("ABCDE".into()), "r".into(), SessionId("h".into()), 16, &["alpha", "bravo"], false);
        room.cell_mut(0).unwrap().owner = Some("alpha".to_string());
        room.cell_mut(1).unwrap().owner = Some("alpha".to_string());
        assert_eq!(room.territory_count("alpha"), 2);
        assert_eq!(room.territory_count("bravo"), 0);
    }

    #[test]
    fn grid_has_the_configured_cell_count() {
        let room = WarfrontRoom::new(RoomCode("ABCDE".into()), "r".into(), SessionId("h".into()), 16, &["alpha", "bravo"], false);
        assert_eq!(room.cell_count(), DEFAULT_CELL_COUNT);
    }
}
