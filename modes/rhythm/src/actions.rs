//! Note-judging action handler: a player reports hitting the next unjudged note at
//! the room's current tick, and the offset from the expected tick classifies the hit
//! (§4.14-style timing window pattern, generalized).

use protocol::{ServerError, SessionId};

use crate::constants::{CHART_NOTE_COUNT, COMBO_BONUS_PER_STEP, GOOD_SCORE, GOOD_WINDOW_TICKS, MISS_SCORE, PERFECT_SCORE, PERFECT_WINDOW_TICKS};
use crate::events::RhythmEvent;
use crate::room::RhythmRoom;

fn err(code: &str, message: impl Into<String>) -> ServerError {
    ServerError::validation(format!("RHYTHM_{code}"), message)
}

pub fn handle_hit_note(room: &mut RhythmRoom, session_id: &SessionId) -> Result<RhythmEvent, ServerError> {
    let tick = room.core.tick;
    let player = room.core.player_mut(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
    if player.next_unjudged_index >= CHART_NOTE_COUNT {
        return Err(err("CHART_DONE", "no more notes to judge"));
    }
    let index = player.next_unjudged_index;
    let expected = RhythmRoom::expected_tick(index);
    let offset = tick.abs_diff(expected);

    let (judgement, base_score) = if offset <= PERFECT_WINDOW_TICKS {
        ("perfect", PERFECT_SCORE)
    } else if offset <= GOOD_WINDOW_TICKS {
        ("good", GOOD_SCORE)
    } else {
        ("miss", MISS_SCORE)
    };

    player.next_unjudged_index += 1;
    if judgement == "miss" {
        player.combo = 0;
        player.notes_missed += 1;
    } else {
        player.combo += 1;
        player.notes_hit += 1;
    }
    let score = base_score + (player.combo as i64) * COMBO_BONUS_PER_STEP;
    player.score += score;

    Ok(RhythmEvent::NoteJudged { session_id: session_id.to_string(), index, judgement, score, combo: player.combo })
}

pub fn handle_chat(session_id: &SessionId, text: String) -> RhythmEvent {
    RhythmEvent::Chat { session_id: session_id.to_string(), text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::RoomCode;

    use crate::player::RhythmPlayer;

    fn room() -> RhythmRoom {
        let mut room = RhythmRoom::new(RoomCode("ABCDE".into()), "r".into(), SessionId("h".into()), 2, 1);
        room.core.insert_player(RhythmPlayer::new(SessionId("h".into()), "Host".into(), 0));
        room
    }

    #[test]
    fn hitting_exactly_on_time_is_a_perfect() {
        let mut room = room();
        room.core.tick = RhythmRoom::expected_tick(0);
        let event = handle_hit_note(&mut room, &SessionId("h".into())).unwrap();
        assert!(matches!(event, RhythmEvent::NoteJudged { judgement: "perfect", .. }));
    }

    #[test]
    fn hitting_far_off_beat_is_a_miss_and_resets_combo() {
        let mut room = room();
        room.core.tick = RhythmRoom::expected_tick(0);
        handle_hit_note(&mut room, &SessionId("h".into())).unwrap();
        room.core.tick = RhythmRoom::expected_tick(1) + 50;
        let event = handle_hit_note(&mut room, &SessionId("h".into())).unwrap();
        assert!(matches!(event, RhythmEvent::NoteJudged { judgement: "miss", combo: 0, .. }));
    }

    #[test]
    fn judging_past_the_chart_end_is_rejected() {
        let mut room = room();
        room.core.player_mut(&SessionId("h".into())).unwrap().next_unjudged_index = CHART_NOTE_COUNT;
        assert!(handle_hit_note(&mut room, &SessionId("h".into())).is_err());
    }
}
