//! The warfront tick pipeline (§4.11): drain effects, advance capture, sweep expired
//! effects, periodic broadcasts, win-condition evaluation.

use std::collections::HashMap;

use serde_json::{json, Value};
use sim_core::effects::CrossModeEffect;

use crate::constants::*;
use crate::events::WarfrontEvent;
use crate::room::WarfrontRoom;

#[derive(Default)]
pub struct TickOutcome {
    pub events: Vec<WarfrontEvent>,
    pub game_over: bool,
}

pub fn step(room: &mut WarfrontRoom) -> TickOutcome {
    room.core.tick += 1;
    let tick = room.core.tick;
    let mut out = TickOutcome::default();

    apply_effects(room, &mut out);
    advance_capture(room);
    sweep_effects(room, &mut out);

    if tick % TERRITORY_BROADCAST_INTERVAL == 0 {
        out.events.push(WarfrontEvent::TerritoryUpdate { cells: cells_json(room), team_counts: team_counts_json(room) });
    }
    if tick % RESOURCE_BROADCAST_INTERVAL == 0 {
        for team_id in room.team_ids() {
            if let Some(pool) = room.resources.get(&team_id) {
                out.events.push(WarfrontEvent::ResourcesUpdate {
                    team_id: team_id.clone(),
                    resources: json!(pool.as_map()),
                });
            }
        }
    }

    evaluate_win_condition(room, tick, &mut out);
    out
}

fn apply_effects(room: &mut WarfrontRoom, out: &mut TickOutcome) {
    // `drain_and_apply`'s closure only sees `&CrossModeEffect`, so territory/status
    // mutations happen inline (they only need `cells`); player-damage and
    // resource-grant effects are collected here and applied in a second pass against
    // `room.core`/`room.resources` right after, preserving FIFO order (I8) since both
    // passes iterate in the same drained sequence.
    let cells = &mut room.cells;
    let mut events = Vec::new();
    let mut deferred: Vec<CrossModeEffect> = Vec::new();
    room.effects.drain_and_apply(|effect| match effect {
        CrossModeEffect::DamagePlayer { .. } | CrossModeEffect::GrantResource { .. } | CrossModeEffect::SpawnHazard { .. } => {
            deferred.push(effect.clone());
        }
        CrossModeEffect::ApplyStatus { target_id, status, .. } => {
            events.push(WarfrontEvent::EffectApplied { kind: status.clone(), target: target_id.clone() });
        }
        CrossModeEffect::CaptureProgress { zone_id, team_id, delta } => {
            if let Some(cell) = zone_id.parse::<usize>().ok().and_then(|id| cells.get_mut(id)) {
                cell.advance_capture(team_id, *delta, CAPTURE_THRESHOLD);
            }
        }
        CrossModeEffect::HealTerritory { zone_id, amount } => {
            if let Some(cell) = zone_id.parse::<usize>().ok().and_then(|id| cells.get_mut(id)) {
                cell.heal(*amount);
            }
        }
        CrossModeEffect::DamageTerritory { zone_id, amount } => {
            if let Some(cell) = zone_id.parse::<usize>().ok().and_then(|id| cells.get_mut(id)) {
                cell.damage(*amount);
            }
        }
        CrossModeEffect::Fortify { zone_id, levels } => {
            if let Some(cell) = zone_id.parse::<usize>().ok().and_then(|id| cells.get_mut(id)) {
                cell.fortify(*levels);
            }
        }
    });
    out.events.extend(events);

    for effect in deferred {
        match effect {
            CrossModeEffect::DamagePlayer { target_id, amount } => {
                let target = protocol::SessionId(target_id.clone());
                if let Some(player) = room.core.player_mut(&target) {
                    player.health -= amount;
                    if player.health <= 0 {
                        player.deaths += 1;
                        out.events.push(WarfrontEvent::PlayerDied { session_id: target_id, killer: None });
                    }
                }
            }
            CrossModeEffect::GrantResource { team_id, resource, amount } => {
                room.resources.entry(team_id).or_default().grant(&resource, amount);
            }
            CrossModeEffect::SpawnHazard { .. } => {}
            _ => unreachable!("only deferred kinds reach this loop"),
        }
    }
}

fn advance_capture(room: &mut WarfrontRoom) {
    let mut soldier_counts: HashMap<(usize, String), u32> = HashMap::new();
    for player in room.core.players() {
        if let Some(cell_id) = player.current_cell_id {
            *soldier_counts.entry((cell_id, player.team_id.clone())).or_insert(0) += 1;
        }
    }

    for cell in room.cells.iter_mut() {
        let present_teams: Vec<String> = soldier_counts
            .keys()
            .filter(|(id, _)| *id == cell.id)
            .map(|(_, team)| team.clone())
            .collect();

        let slow = 1.0 - (cell.fortification as f64) * SLOW_PER_LEVEL;
        let deltas: Vec<(String, f64)> = soldier_counts
            .iter()
            .filter(|((id, _), _)| *id == cell.id)
            .map(|((_, team), count)| (team.clone(), CAPTURE_RATE * (*count as f64) * slow.max(0.1)))
            .collect();
        for (team_id, delta) in deltas {
            cell.advance_capture(&team_id, delta, CAPTURE_THRESHOLD);
        }

        let contributing: Vec<String> = cell.capture_progress.keys().cloned().collect();
        for team_id in contributing {
            if !present_teams.contains(&team_id) {
                let entry = cell.capture_progress.entry(team_id).or_insert(0.0);
                *entry = (*entry - RIVAL_PROGRESS_DECAY * 0.01).max(0.0);
            }
        }
    }
}

fn sweep_effects(room: &mut WarfrontRoom, out: &mut TickOutcome) {
    let tick = room.core.tick;
    for expired in room.effects.sweep_expired(tick) {
        out.events.push(WarfrontEvent::EffectExpired { target: expired.target_id, status: expired.status });
    }
}

fn cells_json(room: &WarfrontRoom) -> Value {
    json!(room
        .cells
        .iter()
        .map(|c| json!({
            "id": c.id,
            "x": c.x,
            "y": c.y,
            "owner": c.owner,
            "health": c.health,
            "fortification": c.fortification,
        }))
        .collect::<Vec<_>>())
}

fn team_counts_json(room: &WarfrontRoom) -> Value {
    let counts: HashMap<String, usize> = room
        .team_ids()
        .into_iter()
        .map(|team| {
            let count = room.territory_count(&team);
            (team, count)
        })
        .collect();
    json!(counts)
}

fn evaluate_win_condition(room: &mut WarfrontRoom, tick: u64, out: &mut TickOutcome) {
    if room.winner.is_some() {
        return;
    }
    if tick >= GAME_DURATION_TICKS {
        room.winner = Some("none".to_string());
        out.game_over = true;
        out.events.push(WarfrontEvent::GameOver { winner: "none".to_string() });
        return;
    }

    if room.ffa {
        for team in room.team_ids() {
            if room.territory_count(&team) >= FFA_WIN_TERRITORY_COUNT {
                room.winner = Some(team.clone());
                out.game_over = true;
                out.events.push(WarfrontEvent::GameOver { winner: team });
                return;
            }
        }
        return;
    }

    let required = (room.cell_count() as f64 * TEAM_WIN_FRACTION).ceil() as usize;
    let leader = room
        .team_ids()
        .into_iter()
        .map(|team| (room.territory_count(&team), team))
        .filter(|(count, _)| *count >= required)
        .max_by_key(|(count, _)| *count)
        .map(|(_, team)| team);

    match (&leader, &room.holding_team) {
        (Some(team), Some(holding)) if team == holding => {
            room.hold_streak_ticks += 1;
        }
        (Some(team), _) => {
            room.holding_team = Some(team.clone());
            room.hold_streak_ticks = 1;
        }
        (None, _) => {
            room.holding_team = None;
            room.hold_streak_ticks = 0;
        }
    }

    let hold_threshold_ticks = TEAM_WIN_HOLD_SECONDS * TICK_RATE_HZ as u64;
    if let Some(team) = &room.holding_team {
        if room.hold_streak_ticks >= hold_threshold_ticks {
            let winner = team.clone();
            room.winner = Some(winner.clone());
            out.game_over = true;
            out.events.push(WarfrontEvent::GameOver { winner });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::{RoomCode, SessionId};

    use crate::player::{Role, WarfrontPlayer};

    fn room() -> WarfrontRoom {
        WarfrontRoom::new(RoomCode("ABCDE".into()), "r".into(), SessionId("h".into()), 16, &["alpha", "bravo"], false)
    }

    #[test]
    fn capture_progress_advances_with_soldier_presence() {
        let mut room = room();
        let mut p1 = WarfrontPlayer::new(SessionId("a".into()), "A".into(), 0, "alpha".into(), Role::Soldier);
        p1.current_cell_id = Some(0);
        let mut p2 = WarfrontPlayer::new(SessionId("b".into()), "B".into(), 1, "alpha".into(), Role::Soldier);
        p2.current_cell_id = Some(0);
        room.core.insert_player(p1);
        room.core.insert_player(p2);

        for _ in 0..200 {
            step(&mut room);
        }
        assert_eq!(room.cell(0).unwrap().owner.as_deref(), Some("alpha"));
    }

    #[test]
    fn rival_progress_decays_when_nobody_present() {
        let mut room = room();
        room.cell_mut(0).unwrap().capture_progress.insert("bravo".to_string(), 0.5);
        step(&mut room);
        assert!(room.cell(0).unwrap().progress_of("bravo") < 0.5);
    }

    #[test]
    fn ffa_win_condition_triggers_at_configured_territory_count() {
        let mut room = room();
        room.ffa = true;
        for i in 0..FFA_WIN_TERRITORY_COUNT {
            room.cell_mut(i).unwrap().owner = Some("alpha".to_string());
        }
        let outcome = step(&mut room);
        assert!(outcome.game_over);
        assert_eq!(room.winner.as_deref(), Some("alpha"));
    }

    #[test]
    fn territory_update_broadcasts_on_the_configured_interval() {
        let mut room = room();
        let mut broadcasts = 0;
        for _ in 0..(TERRITORY_BROADCAST_INTERVAL * 2) {
            let outcome = step(&mut room);
            if outcome.events.iter().any(|e| matches!(e, WarfrontEvent::TerritoryUpdate { .. })) {
                broadcasts += 1;
            }
        }
        assert_eq!(broadcasts, 2);
    }
}
