//! Player action handlers for the arena deathmatch loop: free movement and raycast-free
//! hitscan shots resolved purely on reported aim (§4.10-style pattern generalized).

use protocol::{ServerError, SessionId};

use crate::constants::{RESPAWN_TICKS, SHOT_DAMAGE, SHOT_RANGE, STARTING_HEALTH};
use crate::events::ArenaEvent;
use crate::room::ArenaRoom;

fn err(code: &str, message: impl Into<String>) -> ServerError {
    ServerError::validation(format!("FPS_{code}"), message)
}

fn distance(ax: f64, ay: f64, az: f64, bx: f64, by: f64, bz: f64) -> f64 {
    ((ax - bx).powi(2) + (ay - by).powi(2) + (az - bz).powi(2)).sqrt()
}

pub fn handle_move(room: &mut ArenaRoom, session_id: &SessionId, x: f64, y: f64, z: f64) -> Result<ArenaEvent, ServerError> {
    let player = room.core.player_mut(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
    if player.dead {
        return Err(err("DEAD", "dead players cannot move"));
    }
    player.x = x;
    player.y = y;
    player.z = z;
    Ok(ArenaEvent::PlayerMoved { session_id: session_id.to_string(), x, y, z })
}

/// Resolves a shot against a named target (§4.10 `handle_attack` pattern): in range,
/// line-of-sight is not modeled, damage is flat, and a kill attributes a score and
/// schedules a respawn.
pub fn handle_shoot(room: &mut ArenaRoom, session_id: &SessionId, target: &SessionId) -> Result<Vec<ArenaEvent>, ServerError> {
    let (sx, sy, sz) = {
        let shooter = room.core.player(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
        if shooter.dead {
            return Err(err("DEAD", "dead players cannot shoot"));
        }
        (shooter.x, shooter.y, shooter.z)
    };
    let (tx, ty, tz, target_dead) = {
        let victim = room.core.player(target).ok_or_else(|| err("TARGET_NOT_FOUND", "unknown target"))?;
        (victim.x, victim.y, victim.z, victim.dead)
    };
    if target_dead {
        return Err(err("TARGET_DEAD", "target is already dead"));
    }
    let hit = distance(sx, sy, sz, tx, ty, tz) <= SHOT_RANGE as f64;
    if !hit {
        return Ok(vec![ArenaEvent::ShotFired { session_id: session_id.to_string(), target: Some(target.to_string()), hit: false }]);
    }

    let mut events = vec![ArenaEvent::ShotFired { session_id: session_id.to_string(), target: Some(target.to_string()), hit: true }];
    let tick = room.core.tick;
    let victim = room.core.player_mut(target).unwrap();
    victim.health -= SHOT_DAMAGE;
    if victim.health <= 0 {
        victim.health = 0;
        victim.dead = true;
        victim.deaths += 1;
        victim.respawn_at_tick = Some(tick + RESPAWN_TICKS);
        events.push(ArenaEvent::PlayerDied { session_id: target.to_string(), killer: Some(session_id.to_string()) });
        let shooter = room.core.player_mut(session_id).unwrap();
        shooter.kills += 1;
    }
    Ok(events)
}

pub fn handle_chat(session_id: &SessionId, text: String) -> ArenaEvent {
    ArenaEvent::Chat { session_id: session_id.to_string(), text }
}

pub fn default_spawn_health() -> i32 {
    STARTING_HEALTH
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::RoomCode;

    use crate::player::ArenaPlayer;

    fn room() -> ArenaRoom {
        let mut room = ArenaRoom::new(RoomCode("ABCDE".into()), "r".into(), SessionId("h".into()), 8, 1);
        room.core.insert_player(ArenaPlayer::new(SessionId("h".into()), "Host".into(), 0, (0.0, 0.0, 0.0)));
        room.core.insert_player(ArenaPlayer::new(SessionId("g".into()), "Guest".into(), 1, (5.0, 0.0, 0.0)));
        room
    }

    #[test]
    fn shot_in_range_deals_damage() {
        let mut room = room();
        handle_shoot(&mut room, &SessionId("h".into()), &SessionId("g".into())).unwrap();
        assert_eq!(room.core.player(&SessionId("g".into())).unwrap().health, STARTING_HEALTH - SHOT_DAMAGE);
    }

    #[test]
    fn lethal_damage_kills_and_attributes_the_kill() {
        let mut room = room();
        for _ in 0..10 {
            let _ = handle_shoot(&mut room, &SessionId("h".into()), &SessionId("g".into()));
        }
        let victim = room.core.player(&SessionId("g".into())).unwrap();
        assert!(victim.dead);
        assert_eq!(victim.deaths, 1);
        assert_eq!(room.core.player(&SessionId("h".into())).unwrap().kills, 1);
    }

    #[test]
    fn shooting_a_dead_target_is_rejected() {
        let mut room = room();
        for _ in 0..10 {
            let _ = handle_shoot(&mut room, &SessionId("h".into()), &SessionId("g".into()));
        }
        assert!(handle_shoot(&mut room, &SessionId("h".into()), &SessionId("g".into())).is_err());
    }

    #[test]
    fn out_of_range_shot_reports_a_miss_without_damage() {
        let mut room = room();
        room.core.player_mut(&SessionId("g".into())).unwrap().x = 1000.0;
        let events = handle_shoot(&mut room, &SessionId("h".into()), &SessionId("g".into())).unwrap();
        assert!(matches!(events[0], ArenaEvent::ShotFired { hit: false, .. }));
        assert_eq!(room.core.player(&SessionId("g".into())).unwrap().health, STARTING_HEALTH);
    }
}
