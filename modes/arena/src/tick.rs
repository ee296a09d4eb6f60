//! The arena tick pipeline: respawn timers and the deathmatch kill-score win
//! condition (§4.9 uniform lifecycle, generalized from §4.10's `CheckWinCondition`).

use crate::constants::KILL_SCORE_LIMIT;
use crate::events::ArenaEvent;
use crate::room::ArenaRoom;

#[derive(Default)]
pub struct TickOutcome {
    pub events: Vec<ArenaEvent>,
    pub game_over: bool,
}

pub fn step(room: &mut ArenaRoom) -> TickOutcome {
    room.core.tick += 1;
    let tick = room.core.tick;
    let mut out = TickOutcome::default();

    let respawns: Vec<protocol::SessionId> = room
        .core
        .players()
        .iter()
        .filter(|p| p.dead && p.respawn_at_tick.map(|t| tick >= t).unwrap_or(false))
        .map(|p| p.session_id.clone())
        .collect();

    for session_id in respawns {
        let spawn = room.spawn_point(tick as u32);
        let player = room.core.player_mut(&session_id).unwrap();
        player.x = spawn.0;
        player.y = spawn.1;
        player.z = spawn.2;
        player.health = crate::constants::STARTING_HEALTH;
        player.dead = false;
        player.respawn_at_tick = None;
        out.events.push(ArenaEvent::PlayerRespawned { session_id: session_id.to_string(), x: spawn.0, y: spawn.1, z: spawn.2 });
    }

    if let Some(winner) = room.core.players().iter().find(|p| p.kills >= KILL_SCORE_LIMIT) {
        out.events.push(ArenaEvent::MatchOver { winner: winner.session_id.to_string() });
        out.game_over = true;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{RoomCode, SessionId};

    use crate::player::ArenaPlayer;

    fn room() -> ArenaRoom {
        let mut room = ArenaRoom::new(RoomCode("ABCDE".into()), "r".into(), SessionId("h".into()), 8, 1);
        room.core.insert_player(ArenaPlayer::new(SessionId("h".into()), "Host".into(), 0, (0.0, 0.0, 0.0)));
        room
    }

    #[test]
    fn dead_player_respawns_once_the_timer_elapses() {
        let mut room = room();
        let p = room.core.player_mut(&SessionId("h".into())).unwrap();
        p.dead = true;
        p.respawn_at_tick = Some(2);
        let _ = step(&mut room);
        let outcome = step(&mut room);
        assert!(!room.core.player(&SessionId("h".into())).unwrap().dead);
        assert!(outcome.events.iter().any(|e| matches!(e, ArenaEvent::PlayerRespawned { .. })));
    }

    #[test]
    fn reaching_the_kill_score_limit_ends_the_match() {
        let mut room = room();
        room.core.player_mut(&SessionId("h".into())).unwrap().kills = KILL_SCORE_LIMIT;
        let outcome = step(&mut room);
        assert!(outcome.game_over);
    }
}
