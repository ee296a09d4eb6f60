//! Role action handlers (§4.11 "Role action semantics"). Each handler runs under the
//! room lock outside the tick loop and enqueues a [`CrossModeEffect`] rather than
//! mutating territory/resource state directly, so application stays ordered FIFO at
//! the start of the next tick (I6-I8).

use protocol::{ServerError, SessionId};
use sim_core::effects::CrossModeEffect;
use sim_core::rng::Rng;

use crate::constants::*;
use crate::player::Role;
use crate::room::WarfrontRoom;

fn err(code: &str, message: impl Into<String>) -> ServerError {
    ServerError::validation(format!("WF_{code}"), message)
}

fn require_role(room: &WarfrontRoom, session_id: &SessionId, role: Role) -> Result<(), ServerError> {
    let player = room.core.player(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
    if player.role != role {
        return Err(err("WRONG_ROLE", "action does not match the player's role"));
    }
    Ok(())
}

/// Moves a player and updates which territory cell they currently occupy (drives
/// §4.11 step 2's per-cell soldier counting).
pub fn handle_move(room: &mut WarfrontRoom, session_id: &SessionId, x: i32, y: i32, cell_id: Option<usize>) -> Result<(), ServerError> {
    if let Some(id) = cell_id {
        if room.cell(id).is_none() {
            return Err(err("BAD_CELL", "unknown territory cell"));
        }
    }
    let player = room.core.player_mut(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
    player.x = x;
    player.y = y;
    player.current_cell_id = cell_id;
    Ok(())
}

/// Defender `line_clear(n)`: heals the defender's current territory; `n >= 2` also
/// attaches a team-wide shield boost.
pub fn handle_line_clear(room: &mut WarfrontRoom, session_id: &SessionId, lines: u32) -> Result<(), ServerError> {
    require_role(room, session_id, Role::Defender)?;
    let player = room.core.player(session_id).unwrap();
    let cell_id = player.current_cell_id.ok_or_else(|| err("NO_CELL", "defender is not in a territory"))?;
    let team_id = player.team_id.clone();
    let tick = room.core.tick;

    room.effects.enqueue(CrossModeEffect::HealTerritory { zone_id: cell_id.to_string(), amount: LINE_CLEAR_HEAL });
    if lines >= 2 {
        room.effects.enqueue(CrossModeEffect::ApplyStatus {
            target_id: team_id,
            status: "shield_boost".to_string(),
            expires_at_tick: tick + SHIELD_BOOST_DURATION_TICKS,
        });
    }
    Ok(())
}

/// Defender `combo(k)`: `k >= 3` sends a team energy pulse proportional to `k`.
pub fn handle_combo(room: &mut WarfrontRoom, session_id: &SessionId, combo_count: u32) -> Result<(), ServerError> {
    require_role(room, session_id, Role::Defender)?;
    if combo_count < COMBO_MIN_COUNT {
        return Ok(());
    }
    let team_id = room.core.player(session_id).unwrap().team_id.clone();
    room.effects.enqueue(CrossModeEffect::GrantResource {
        team_id,
        resource: "energy".to_string(),
        amount: COMBO_ENERGY_PER_COUNT * combo_count as i64,
    });
    Ok(())
}

/// Defender `t_spin`: attaches a build-speed boost to the whole team.
pub fn handle_t_spin(room: &mut WarfrontRoom, session_id: &SessionId) -> Result<(), ServerError> {
    require_role(room, session_id, Role::Defender)?;
    let team_id = room.core.player(session_id).unwrap().team_id.clone();
    let tick = room.core.tick;
    room.effects.enqueue(CrossModeEffect::ApplyStatus {
        target_id: team_id,
        status: "build_speed".to_string(),
        expires_at_tick: tick + BUILD_SPEED_DURATION_TICKS,
    });
    Ok(())
}

/// Defender `tetris`: damages a random enemy territory, chosen with the
/// tick/session-seeded deterministic RNG (§4.1).
pub fn handle_tetris(room: &mut WarfrontRoom, session_id: &SessionId) -> Result<(), ServerError> {
    require_role(room, session_id, Role::Defender)?;
    let team_id = room.core.player(session_id).unwrap().team_id.clone();
    let tick = room.core.tick;
    let seed = room.core.seed;

    let enemy_cells: Vec<usize> = room
        .cells
        .iter()
        .filter(|c| c.owner.is_some() && c.owner.as_deref() != Some(team_id.as_str()))
        .map(|c| c.id)
        .collect();
    if enemy_cells.is_empty() {
        return Ok(());
    }
    let mut rng = Rng::for_cell(seed, tick, session_id.0.len() as u64);
    let pick = enemy_cells[rng.next_int(0, enemy_cells.len() as i64 - 1) as usize];
    room.effects.enqueue(CrossModeEffect::DamageTerritory { zone_id: pick.to_string(), amount: TETRIS_TERRITORY_DAMAGE });
    Ok(())
}

/// Soldier `hit`: accumulates `damageDealt` locally (not deferred — it's a pure
/// accumulator on the attacking player, not a cross-entity mutation).
pub fn handle_soldier_hit(room: &mut WarfrontRoom, session_id: &SessionId, damage: i64) -> Result<(), ServerError> {
    require_role(room, session_id, Role::Soldier)?;
    let player = room.core.player_mut(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
    player.damage_dealt += damage.max(0);
    Ok(())
}

/// Soldier `died`: attributes kills/deaths and enqueues the team score bonus plus
/// damage to the victim's current territory (§4.11).
pub fn handle_soldier_died(room: &mut WarfrontRoom, killer: &SessionId, victim: &SessionId) -> Result<(), ServerError> {
    let victim_cell = room.core.player(victim).and_then(|p| p.current_cell_id);

    {
        let killer_player = room.core.player_mut(killer).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown killer"))?;
        killer_player.kills += 1;
    }
    {
        let victim_player = room.core.player_mut(victim).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown victim"))?;
        victim_player.deaths += 1;
    }

    let killer_team = room.core.player(killer).unwrap().team_id.clone();
    room.effects.enqueue(CrossModeEffect::GrantResource { team_id: killer_team, resource: "score".to_string(), amount: KILL_TEAM_SCORE_BONUS });
    if let Some(cell_id) = victim_cell {
        room.effects.enqueue(CrossModeEffect::DamageTerritory { zone_id: cell_id.to_string(), amount: KILL_TERRITORY_DAMAGE });
    }
    Ok(())
}

/// Engineer mining: grants team resources per the static block-type mapping.
pub fn handle_engineer_mine(room: &mut WarfrontRoom, session_id: &SessionId, block_id: &str) -> Result<(), ServerError> {
    require_role(room, session_id, Role::Engineer)?;
    let team_id = room.core.player(session_id).unwrap().team_id.clone();
    if let Some((_, resource, amount)) = ENGINEER_MINING_YIELDS.iter().find(|(b, _, _)| *b == block_id) {
        room.effects.enqueue(CrossModeEffect::GrantResource { team_id, resource: resource.to_string(), amount: *amount });
    }
    Ok(())
}

/// Engineer placing a block inside a territory the engineer's team owns: enqueues a
/// fortification buff.
pub fn handle_engineer_place(room: &mut WarfrontRoom, session_id: &SessionId) -> Result<(), ServerError> {
    require_role(room, session_id, Role::Engineer)?;
    let player = room.core.player(session_id).unwrap();
    let team_id = player.team_id.clone();
    let cell_id = match player.current_cell_id {
        Some(id) => id,
        None => return Ok(()),
    };
    let owned = room.cell(cell_id).and_then(|c| c.owner.as_deref()) == Some(team_id.as_str());
    if owned {
        room.effects.enqueue(CrossModeEffect::Fortify { zone_id: cell_id.to_string(), levels: FORTIFICATION_BUFF_LEVELS });
    }
    Ok(())
}

/// Engineer crafting: enqueues an ammo resupply status for the crafting engineer.
pub fn handle_engineer_craft(room: &mut WarfrontRoom, session_id: &SessionId) -> Result<(), ServerError> {
    require_role(room, session_id, Role::Engineer)?;
    let tick = room.core.tick;
    room.effects.enqueue(CrossModeEffect::ApplyStatus {
        target_id: session_id.to_string(),
        status: "ammo_resupply".to_string(),
        expires_at_tick: tick + AMMO_RESUPPLY_DURATION_TICKS,
    });
    Ok(())
}

/// Commander ability: debits the team pool atomically (§3 Resource Pool; P7), then
/// applies ability-specific effects. `scan` reveals enemies in a cell directly
/// (returns the revealed session ids rather than enqueuing, since it's informational
/// and doesn't mutate shared state); the other abilities attach timed effects.
pub fn handle_commander_ability(
    room: &mut WarfrontRoom,
    session_id: &SessionId,
    ability: &str,
    cost: &[(&str, i64)],
    target_cell: Option<usize>,
) -> Result<Option<Vec<String>>, ServerError> {
    require_role(room, session_id, Role::Commander)?;
    let team_id = room.core.player(session_id).unwrap().team_id.clone();
    let pool = room.resources.entry(team_id.clone()).or_default();
    if !pool.try_spend(cost) {
        return Err(ServerError::resource("WF_INSUFFICIENT_RESOURCES", "team does not have enough resources for this ability"));
    }

    let tick = room.core.tick;
    match ability {
        "scan" => {
            let cell_id = target_cell.ok_or_else(|| err("NO_TARGET", "scan requires a target cell"))?;
            let revealed: Vec<String> = room
                .core
                .players()
                .iter()
                .filter(|p| p.team_id != team_id && p.current_cell_id == Some(cell_id))
                .map(|p| p.session_id.to_string())
                .collect();
            Ok(Some(revealed))
        }
        "shield_generator" => {
            room.effects.enqueue(CrossModeEffect::ApplyStatus {
                target_id: team_id,
                status: "shield_generator".to_string(),
                expires_at_tick: tick + SHIELD_BOOST_DURATION_TICKS,
            });
            Ok(None)
        }
        "airstrike" => {
            let cell_id = target_cell.ok_or_else(|| err("NO_TARGET", "airstrike requires a target cell"))?;
            room.effects.enqueue(CrossModeEffect::DamageTerritory { zone_id: cell_id.to_string(), amount: TETRIS_TERRITORY_DAMAGE * 2 });
            Ok(None)
        }
        other => Err(err("UNKNOWN_ABILITY", format!("unknown commander ability `{other}`"))),
    }
}

pub fn handle_chat(session_id: &SessionId, text: String) -> crate::events::WarfrontEvent {
    let _ = text;
    crate::events::WarfrontEvent::EffectApplied { kind: "chat".to_string(), target: session_id.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::RoomCode;

    fn room() -> WarfrontRoom {
        let mut room = WarfrontRoom::new(RoomCode("ABCDE".into()), "r".into(), SessionId("h".into()), 16, &["alpha", "bravo"], false);
        room.core.insert_player(crate::player::WarfrontPlayer::new(
            SessionId("h".into()),
            "Host".into(),
            0,
            "alpha".into(),
            Role::Defender,
        ));
        room
    }

    #[test]
    fn line_clear_heals_current_territory() {
        let mut room = room();
        room.core.player_mut(&SessionId("h".into())).unwrap().current_cell_id = Some(0);
        handle_line_clear(&mut room, &SessionId("h".into()), 1).unwrap();
        assert_eq!(room.effects.pending_len(), 1);
    }

    #[test]
    fn line_clear_without_a_cell_is_rejected() {
        let mut room = room();
        assert!(handle_line_clear(&mut room, &SessionId("h".into()), 1).is_err());
    }

    #[test]
    fn wrong_role_is_rejected() {
        let mut room = room();
        assert!(handle_combo(&mut room, &SessionId("h".into()), 5).is_ok());
        room.core.player_mut(&SessionId("h".into())).unwrap().role = Role::Soldier;
        assert!(handle_t_spin(&mut room, &SessionId("h".into())).is_err());
    }

    #[test]
    fn commander_ability_requires_sufficient_resources() {
        let mut room = room();
        room.core.player_mut(&SessionId("h".into())).unwrap().role = Role::Commander;
        let err = handle_commander_ability(&mut room, &SessionId("h".into()), "shield_generator", &[("iron", 50)], None).unwrap_err();
        assert_eq!(err.code, "WF_INSUFFICIENT_RESOURCES");
    }

    #[test]
    fn soldier_death_attributes_kill_and_enqueues_effects() {
        let mut room = room();
        room.core.player_mut(&SessionId("h".into())).unwrap().role = Role::Soldier;
        room.core.insert_player(crate::player::WarfrontPlayer::new(SessionId("v".into()), "Victim".into(), 1, "bravo".into(), Role::Soldier));
        room.core.player_mut(&SessionId("v".into())).unwrap().current_cell_id = Some(2);
        handle_soldier_died(&mut room, &SessionId("h".into()), &SessionId("v".into())).unwrap();
        assert_eq!(room.core.player(&SessionId("h".into())).unwrap().kills, 1);
        assert_eq!(room.core.player(&SessionId("v".into())).unwrap().deaths, 1);
        assert_eq!(room.effects.pending_len(), 2);
    }
}
