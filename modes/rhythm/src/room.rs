//! Rhythm room state: [`RoomCore`] plus the fixed note chart both players judge
//! against (§3, generalized from the teacher's beat-tracking state).

use protocol::{RoomCode, SessionId};
use server_core::RoomCore;

use crate::constants::{CHART_NOTE_COUNT, COLOR_PALETTE_LEN, NOTE_INTERVAL_TICKS};
use crate::player::RhythmPlayer;

pub struct RhythmRoom {
    pub core: RoomCore<RhythmPlayer>,
    /// Index of the next note not yet announced via a `note_spawned` event.
    pub next_note_index: u32,
}

impl RhythmRoom {
    pub fn new(code: RoomCode, name: String, host: SessionId, max_players: u16, seed: u32) -> Self {
        let mut core = RoomCore::new(code, name, host, max_players);
        core.seed = seed;
        RhythmRoom { core, next_note_index: 0 }
    }

    /// The tick a given note index is expected to be hit on, 1-indexed chart
    /// positions spaced `NOTE_INTERVAL_TICKS` apart.
    pub fn expected_tick(index: u32) -> u64 {
        (index as u64 + 1) * NOTE_INTERVAL_TICKS
    }

    pub fn chart_is_complete(tick: u64) -> bool {
        tick > Self::expected_tick(CHART_NOTE_COUNT - 1) + crate::constants::GOOD_WINDOW_TICKS
    }

    pub fn next_color_slot(&self) -> u8 {
        self.core.next_color_slot(COLOR_PALETTE_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_ticks_are_evenly_spaced() {
        assert_eq!(RhythmRoom::expected_tick(0), NOTE_INTERVAL_TICKS);
        assert_eq!(RhythmRoom::expected_tick(1), NOTE_INTERVAL_TICKS * 2);
    }
}
