//! The rhythm tick pipeline: announces notes as their spawn tick arrives and ends the
//! match once the chart's final grace window has elapsed (§4.9 uniform lifecycle).

use crate::constants::CHART_NOTE_COUNT;
use crate::events::RhythmEvent;
use crate::room::RhythmRoom;

#[derive(Default)]
pub struct TickOutcome {
    pub events: Vec<RhythmEvent>,
    pub game_over: bool,
}

pub fn step(room: &mut RhythmRoom) -> TickOutcome {
    room.core.tick += 1;
    let tick = room.core.tick;
    let mut out = TickOutcome::default();

    while room.next_note_index < CHART_NOTE_COUNT && RhythmRoom::expected_tick(room.next_note_index) <= tick {
        out.events.push(RhythmEvent::NoteSpawned { index: room.next_note_index, expected_tick: RhythmRoom::expected_tick(room.next_note_index) });
        room.next_note_index += 1;
    }

    if RhythmRoom::chart_is_complete(tick) && room.core.status == server_core::RoomStatus::Playing {
        let scores = room.core.players().iter().map(|p| (p.session_id.to_string(), p.score)).collect();
        out.events.push(RhythmEvent::ChartComplete { scores });
        out.game_over = true;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{RoomCode, SessionId};

    use crate::player::RhythmPlayer;

    fn room() -> RhythmRoom {
        let mut room = RhythmRoom::new(RoomCode("ABCDE".into()), "r".into(), SessionId("h".into()), 2, 1);
        room.core.insert_player(RhythmPlayer::new(SessionId("h".into()), "Host".into(), 0));
        room.core.status = server_core::RoomStatus::Playing;
        room
    }

    #[test]
    fn first_note_spawns_at_its_configured_tick() {
        let mut room = room();
        for _ in 0..(crate::constants::NOTE_INTERVAL_TICKS - 1) {
            let outcome = step(&mut room);
            assert!(outcome.events.is_empty());
        }
        let outcome = step(&mut room);
        assert!(matches!(outcome.events[0], RhythmEvent::NoteSpawned { index: 0, .. }));
    }

    #[test]
    fn chart_ends_after_the_final_grace_window() {
        let mut room = room();
        room.core.tick = RhythmRoom::expected_tick(CHART_NOTE_COUNT - 1) + crate::constants::GOOD_WINDOW_TICKS;
        let outcome = step(&mut room);
        assert!(outcome.game_over);
    }
}
