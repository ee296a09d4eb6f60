//! Player action handlers (§4.10), run synchronously under the room lock outside the
//! tick loop — movement, mining, combat, building, and consumables.

use protocol::{ServerError, SessionId};
use sim_core::grid::Grid;
use sim_core::registry::ToolType;

use crate::constants::*;
use crate::events::BoardEvent;
use crate::player::MiningJob;
use crate::room::BoardRoom;

fn err(code: &str, message: impl Into<String>) -> ServerError {
    ServerError::validation(format!("MC_{code}"), message)
}

pub fn handle_move(room: &mut BoardRoom, session_id: &SessionId, dx: i32, dy: i32) -> Result<BoardEvent, ServerError> {
    let tick = room.core.tick;
    let target = {
        let player = room.core.player(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
        if player.dead {
            return Err(err("DEAD", "dead players cannot move"));
        }
        if tick.saturating_sub(player.last_move_tick) < MOVE_COOLDOWN_TICKS {
            return Err(err("MOVE_COOLDOWN", "movement is still on cooldown"));
        }
        if dx.abs() + dy.abs() != 1 {
            return Err(err("INVALID_MOVE", "move must be exactly one tile"));
        }
        (player.x + dx, player.y + dy)
    };

    if !room.grid.in_bounds(target.0, target.1) {
        return Err(err("OUT_OF_BOUNDS", "target tile is outside the board"));
    }
    let walkable = room
        .grid
        .get(target.0, target.1)
        .and_then(|tile| room.registry.block(&tile.block_id))
        .map(|props| props.walkable)
        .unwrap_or(true);
    if !walkable {
        return Err(err("BLOCKED", "target tile is not walkable"));
    }
    if room.core.players().iter().any(|p| !p.dead && p.x == target.0 && p.y == target.1) {
        return Err(err("OCCUPIED", "target tile is occupied"));
    }

    let player = room.core.player_mut(session_id).unwrap();
    player.x = target.0;
    player.y = target.1;
    player.last_move_tick = tick;
    player.mining = None;
    Ok(BoardEvent::PlayerMoved { session_id: session_id.to_string(), x: target.0, y: target.1 })
}

/// Mining duration in ticks (§4.10 open question: the wrong-tool-but-nonzero-speed
/// penalty formula is kept exactly as documented, not "fixed").
fn mining_duration_ticks(hardness: f64, speed: f64, correct_tool: bool) -> u32 {
    if hardness <= 0.0 {
        return 0;
    }
    let effective_speed = if correct_tool { speed } else { speed * 0.5 };
    (hardness / effective_speed).ceil().max(1.0) as u32
}

pub fn handle_mine(room: &mut BoardRoom, session_id: &SessionId, x: i32, y: i32) -> Result<Option<BoardEvent>, ServerError> {
    let (px, py) = {
        let player = room.core.player(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
        if player.dead {
            return Err(err("DEAD", "dead players cannot mine"));
        }
        (player.x, player.y)
    };
    if Grid::l1_distance(px, py, x, y) > 1 {
        return Err(err("OUT_OF_RANGE", "target is not adjacent"));
    }
    let tile = room.grid.get(x, y).ok_or_else(|| err("OUT_OF_BOUNDS", "target is outside the board"))?;
    let block_id = tile.block_id.clone();
    let biome = tile.biome.clone();
    let props = room
        .registry
        .block(&block_id)
        .ok_or_else(|| err("UNKNOWN_BLOCK", "target block has no registry entry"))?
        .clone();

    let player = room.core.player_mut(session_id).unwrap();
    if player.tool_tier < props.required_tier.0 {
        return Err(err("TOOL_TIER", "better tool required"));
    }
    let correct_tool = player.equipped_tool_type.unwrap_or(ToolType::None) == props.preferred_tool;
    let ticks_total = mining_duration_ticks(props.hardness, player.mining_speed, correct_tool);

    if ticks_total == 0 {
        player.blocks_mined += 1;
        let replacement = exposed_block_for_biome(&biome).to_string();
        room.grid.set(x, y, sim_core::grid::Tile { block_id: replacement.clone(), biome });
        return Ok(Some(BoardEvent::TileMined { x, y, new_block: replacement, by: session_id.to_string() }));
    }

    player.mining = Some(MiningJob { x, y, block_id, ticks_total, ticks_remaining: ticks_total });
    Ok(None)
}

pub fn handle_place_block(
    room: &mut BoardRoom,
    session_id: &SessionId,
    x: i32,
    y: i32,
    block_id: &str,
) -> Result<BoardEvent, ServerError> {
    let (px, py) = {
        let player = room.core.player(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
        if player.dead {
            return Err(err("DEAD", "dead players cannot place blocks"));
        }
        (player.x, player.y)
    };
    if Grid::l1_distance(px, py, x, y) != 1 {
        return Err(err("OUT_OF_RANGE", "target must be exactly one tile away"));
    }
    let occupied = room
        .grid
        .get(x, y)
        .map(|tile| room.registry.block(&tile.block_id).map(|p| p.solid).unwrap_or(false))
        .unwrap_or(true);
    if occupied {
        return Err(err("OCCUPIED", "target tile is not clear"));
    }

    let player = room.core.player_mut(session_id).unwrap();
    let count = player.inventory.get(block_id).copied().unwrap_or(0);
    if count == 0 {
        return Err(err("NO_ITEM", "player does not have that block"));
    }
    player.inventory.insert(block_id.to_string(), count - 1);

    room.grid.set(x, y, sim_core::grid::Tile { block_id: block_id.to_string(), biome: "plains".to_string() });
    Ok(BoardEvent::BlockPlaced { x, y, block_id: block_id.to_string(), by: session_id.to_string() })
}

/// Resolves an attack against a player, a mob, or a raid mob (§4.10 `Attack`): the
/// target id space is disambiguated by shape alone — mob/raid mob ids are plain
/// `u64`s (see [`crate::room::BoardRoom::next_mob_id`]), while session ids are always
/// `player_<millis>_<suffix>` and never parse as one.
pub fn handle_attack(room: &mut BoardRoom, session_id: &SessionId, target: &str) -> Result<Vec<BoardEvent>, ServerError> {
    let tick = room.core.tick;
    let (px, py, damage) = {
        let attacker = room.core.player(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
        if attacker.dead {
            return Err(err("DEAD", "dead players cannot attack"));
        }
        if tick.saturating_sub(attacker.last_attack_tick) < ATTACK_COOLDOWN_TICKS {
            return Err(err("ATTACK_COOLDOWN", "attack is still on cooldown"));
        }
        (attacker.x, attacker.y, attacker.equipped_damage as i32)
    };

    if let Ok(mob_id) = target.parse::<u64>() {
        return attack_mob(room, session_id, mob_id, px, py, damage, tick);
    }

    let target_id = SessionId(target.to_string());
    let victim = room.core.player(&target_id).ok_or_else(|| err("TARGET_NOT_FOUND", "target not in room"))?;
    if Grid::l1_distance(px, py, victim.x, victim.y) > 1 {
        return Err(err("OUT_OF_RANGE", "target is not adjacent"));
    }

    room.core.player_mut(session_id).unwrap().last_attack_tick = tick;
    let victim = room.core.player_mut(&target_id).unwrap();
    let reduced = (damage - victim.armor / 2).max(1);
    victim.health -= reduced;
    if victim.health <= 0 {
        victim.dead = true;
        victim.respawn_tick = tick + RESPAWN_TICKS;
        return Ok(vec![BoardEvent::PlayerDied { session_id: target_id.to_string(), cause: "player".to_string() }]);
    }
    Ok(vec![])
}

fn attack_mob(
    room: &mut BoardRoom,
    session_id: &SessionId,
    mob_id: u64,
    px: i32,
    py: i32,
    damage: i32,
    tick: u64,
) -> Result<Vec<BoardEvent>, ServerError> {
    if let Some(idx) = room.mobs.iter().position(|m| m.id == mob_id) {
        let (mx, my) = (room.mobs[idx].x, room.mobs[idx].y);
        if Grid::l1_distance(px, py, mx, my) > 1 {
            return Err(err("OUT_OF_RANGE", "target is not adjacent"));
        }
        room.core.player_mut(session_id).unwrap().last_attack_tick = tick;
        room.mobs[idx].health -= damage;
        if room.mobs[idx].health <= 0 {
            room.mobs.remove(idx);
            return Ok(vec![BoardEvent::MobDied { id: mob_id }]);
        }
        return Ok(vec![]);
    }
    if let Some(idx) = room.raid_mobs.iter().position(|r| r.mob.id == mob_id) {
        let (mx, my) = (room.raid_mobs[idx].mob.x, room.raid_mobs[idx].mob.y);
        if Grid::l1_distance(px, py, mx, my) > 1 {
            return Err(err("OUT_OF_RANGE", "target is not adjacent"));
        }
        room.core.player_mut(session_id).unwrap().last_attack_tick = tick;
        room.raid_mobs[idx].mob.health -= damage;
        if room.raid_mobs[idx].mob.health <= 0 {
            room.raid_mobs.remove(idx);
            return Ok(vec![BoardEvent::MobDied { id: mob_id }]);
        }
        return Ok(vec![]);
    }
    Err(err("TARGET_NOT_FOUND", "target not in room"))
}

pub fn handle_eat(room: &mut BoardRoom, session_id: &SessionId, item_id: &str) -> Result<(), ServerError> {
    let restore = room
        .registry
        .item(item_id)
        .and_then(|props| props.edible_hunger_restore)
        .ok_or_else(|| err("NOT_EDIBLE", "item cannot be eaten"))?;
    let player = room.core.player_mut(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
    let count = player.inventory.get(item_id).copied().unwrap_or(0);
    if count == 0 {
        return Err(err("NO_ITEM", "player does not have that item"));
    }
    player.inventory.insert(item_id.to_string(), count - 1);
    player.feed(restore as i32);
    Ok(())
}

pub fn handle_select_slot(room: &mut BoardRoom, session_id: &SessionId, item_id: &str) -> Result<(), ServerError> {
    let props = room.registry.item(item_id).cloned();
    let player = room.core.player_mut(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
    match props {
        Some(props) => {
            player.equipped_tool_type = Some(props.tool_type);
            player.equipped_damage = props.damage.max(1);
            player.tool_tier = props.tool_tier.0;
            player.mining_speed = props.mining_speed;
        }
        None => {
            player.equipped_tool_type = None;
            player.equipped_damage = 1;
            player.tool_tier = 0;
            player.mining_speed = 1.0;
        }
    }
    Ok(())
}

pub fn handle_chat(session_id: &SessionId, text: String) -> BoardEvent {
    BoardEvent::Chat { session_id: session_id.to_string(), text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use protocol::RoomCode;
    use sim_core::registry::{BlockProps, ContentRegistry, ItemDrop, ItemProps, ToolTier};

    use crate::player::BoardPlayer;

    fn registry() -> Arc<ContentRegistry> {
        Arc::new(
            ContentRegistry::builder()
                .block(BlockProps {
                    id: "stone".into(),
                    hardness: 2.0,
                    preferred_tool: ToolType::Pickaxe,
                    required_tier: ToolTier(0),
                    drops: vec![ItemDrop { item_id: "stone".into(), chance: 1.0 }],
                    walkable: false,
                    solid: true,
                    light_emission: 0,
                })
                .block(BlockProps {
                    id: "obsidian".into(),
                    hardness: 1.0,
                    preferred_tool: ToolType::Pickaxe,
                    required_tier: ToolTier(2),
                    drops: vec![ItemDrop { item_id: "obsidian".into(), chance: 1.0 }],
                    walkable: false,
                    solid: true,
                    light_emission: 0,
                })
                .item(ItemProps {
                    id: "bread".into(),
                    max_stack: 16,
                    tool_type: ToolType::None,
                    mining_speed: 1.0,
                    tool_tier: ToolTier(0),
                    damage: 0,
                    edible_hunger_restore: Some(4),
                })
                .item(ItemProps {
                    id: "iron_pickaxe".into(),
                    max_stack: 1,
                    tool_type: ToolType::Pickaxe,
                    mining_speed: 4.0,
                    tool_tier: ToolTier(2),
                    damage: 3,
                    edible_hunger_restore: None,
                })
                .build(),
        )
    }

    fn room() -> BoardRoom {
        let mut room = BoardRoom::new(RoomCode("ABCDE".into()), "r".into(), SessionId("h".into()), 4, registry());
        room.core.insert_player(BoardPlayer::new(SessionId("h".into()), "Host".into(), 0, (5, 5)));
        room.grid.set(6, 5, sim_core::grid::Tile { block_id: "stone".into(), biome: "plains".into() });
        room
    }

    #[test]
    fn move_respects_cooldown() {
        let mut room = room();
        assert!(handle_move(&mut room, &SessionId("h".into()), 1, 0).is_err());
    }

    #[test]
    fn move_into_non_walkable_tile_is_rejected() {
        let mut room = room();
        room.core.tick = MOVE_COOLDOWN_TICKS;
        assert!(handle_move(&mut room, &SessionId("h".into()), 1, 0).is_err());
    }

    #[test]
    fn mining_without_tool_takes_longer_than_with_it() {
        let with_tool = mining_duration_ticks(2.0, 1.0, true);
        let without_tool = mining_duration_ticks(2.0, 1.0, false);
        assert!(without_tool > with_tool);
    }

    #[test]
    fn mine_starts_a_job_for_hard_blocks() {
        let mut room = room();
        let outcome = handle_mine(&mut room, &SessionId("h".into()), 6, 5).unwrap();
        assert!(outcome.is_none());
        assert!(room.core.player(&SessionId("h".into())).unwrap().mining.is_some());
    }

    #[test]
    fn eat_restores_hunger_and_consumes_item() {
        let mut room = room();
        room.core.player_mut(&SessionId("h".into())).unwrap().hunger = 10;
        room.core.player_mut(&SessionId("h".into())).unwrap().add_item("bread", 1);
        handle_eat(&mut room, &SessionId("h".into()), "bread").unwrap();
        let player = room.core.player(&SessionId("h".into())).unwrap();
        assert_eq!(player.hunger, 14);
        assert_eq!(player.inventory.get("bread").copied().unwrap_or(0), 0);
    }

    #[test]
    fn select_slot_stores_the_equipped_items_registry_mining_speed() {
        let mut room = room();
        handle_select_slot(&mut room, &SessionId("h".into()), "iron_pickaxe").unwrap();
        let player = room.core.player(&SessionId("h".into())).unwrap();
        assert_eq!(player.mining_speed, 4.0);
        assert_eq!(player.tool_tier, 2);
    }

    #[test]
    fn mining_a_block_above_the_equipped_tier_is_rejected() {
        let mut room = room();
        room.grid.set(6, 5, sim_core::grid::Tile { block_id: "obsidian".into(), biome: "plains".into() });
        let err = handle_mine(&mut room, &SessionId("h".into()), 6, 5).unwrap_err();
        assert_eq!(err.code, "MC_TOOL_TIER");
    }

    #[test]
    fn mining_with_a_high_enough_tier_tool_proceeds() {
        let mut room = room();
        room.grid.set(6, 5, sim_core::grid::Tile { block_id: "obsidian".into(), biome: "plains".into() });
        handle_select_slot(&mut room, &SessionId("h".into()), "iron_pickaxe").unwrap();
        assert!(handle_mine(&mut room, &SessionId("h".into()), 6, 5).is_ok());
    }

    #[test]
    fn instant_mine_replaces_the_tile_with_the_biomes_exposed_block_and_mutates_the_grid() {
        let zero_hardness = Arc::new(
            ContentRegistry::builder()
                .block(BlockProps {
                    id: "stone".into(),
                    hardness: 0.0,
                    preferred_tool: ToolType::Pickaxe,
                    required_tier: ToolTier(0),
                    drops: vec![],
                    walkable: false,
                    solid: true,
                    light_emission: 0,
                })
                .build(),
        );
        let mut room = BoardRoom::new(RoomCode("ABCDE".into()), "r".into(), SessionId("h".into()), 4, zero_hardness);
        room.core.insert_player(BoardPlayer::new(SessionId("h".into()), "Host".into(), 0, (5, 5)));
        room.grid.set(6, 5, sim_core::grid::Tile { block_id: "stone".into(), biome: "desert".into() });

        let event = handle_mine(&mut room, &SessionId("h".into()), 6, 5).unwrap().unwrap();
        match event {
            BoardEvent::TileMined { new_block, .. } => assert_eq!(new_block, "sand"),
            _ => panic!("expected a TileMined event"),
        }
        assert_eq!(room.grid.get(6, 5).unwrap().block_id, "sand");
    }

    #[test]
    fn attack_halves_armor_before_subtracting_and_kills_on_lethal() {
        let mut room = room();
        room.core.tick = ATTACK_COOLDOWN_TICKS;
        room.core.insert_player(BoardPlayer::new(SessionId("g".into()), "Guest".into(), 1, (6, 5)));
        room.core.player_mut(&SessionId("g".into())).unwrap().armor = 4;
        room.core.player_mut(&SessionId("g".into())).unwrap().health = 1;
        room.core.player_mut(&SessionId("h".into())).unwrap().equipped_damage = 3;

        let events = handle_attack(&mut room, &SessionId("h".into()), "g").unwrap();
        // damage 3, armor/2 floor = 2, reduced = max(1, 3-2) = 1, exactly lethal.
        assert!(matches!(events.as_slice(), [BoardEvent::PlayerDied { .. }]));
        assert!(room.core.player(&SessionId("g".into())).unwrap().dead);
    }

    #[test]
    fn attack_resolves_against_a_mob_id_and_emits_mob_died_on_lethal() {
        let mut room = room();
        room.core.tick = ATTACK_COOLDOWN_TICKS;
        room.core.player_mut(&SessionId("h".into())).unwrap().equipped_damage = 50;
        room.mobs.push(crate::entities::Mob {
            id: 7,
            kind: "zombie".into(),
            x: 6,
            y: 5,
            health: 20,
            target: None,
            last_move_tick: 0,
            last_attack_tick: 0,
            hostile: true,
        });
        let events = handle_attack(&mut room, &SessionId("h".into()), "7").unwrap();
        assert!(matches!(events.as_slice(), [BoardEvent::MobDied { id: 7 }]));
        assert!(room.mobs.is_empty());
    }

    #[test]
    fn attack_against_an_unknown_target_id_is_rejected() {
        let mut room = room();
        assert!(handle_attack(&mut room, &SessionId("h".into()), "not-a-real-target").is_err());
    }
}
