//! Player action handlers (generalized §4.10 pattern for the voxel world): movement,
//! mining, and placing blocks directly against the chunked world.

use protocol::{ServerError, SessionId};

use crate::constants::AIR_BLOCK_ID;
use crate::events::OpenWorldEvent;
use crate::room::OpenWorldRoom;

fn err(code: &str, message: impl Into<String>) -> ServerError {
    ServerError::validation(format!("MW_{code}"), message)
}

fn l1(ax: i32, ay: i32, az: i32, bx: i32, by: i32, bz: i32) -> i32 {
    (ax - bx).abs() + (ay - by).abs() + (az - bz).abs()
}

pub fn handle_move(room: &mut OpenWorldRoom, session_id: &SessionId, x: i32, y: i32, z: i32) -> Result<OpenWorldEvent, ServerError> {
    let player = room.core.player_mut(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
    if player.dead {
        return Err(err("DEAD", "dead players cannot move"));
    }
    player.x = x;
    player.y = y;
    player.z = z;
    Ok(OpenWorldEvent::PlayerMoved { session_id: session_id.to_string(), x: x as f64, y: y as f64, z: z as f64 })
}

pub fn handle_mine(room: &mut OpenWorldRoom, session_id: &SessionId, x: i32, y: i32, z: i32) -> Result<OpenWorldEvent, ServerError> {
    let (px, py, pz) = {
        let player = room.core.player(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
        if player.dead {
            return Err(err("DEAD", "dead players cannot mine"));
        }
        (player.x, player.y, player.z)
    };
    if l1(px, py, pz, x, y, z) > 5 {
        return Err(err("OUT_OF_RANGE", "target is not within reach"));
    }
    let block_id = room.world.get_block(x, y, z);
    if block_id == AIR_BLOCK_ID {
        return Err(err("EMPTY_TARGET", "target block is already air"));
    }
    room.world.set_block(x, y, z, AIR_BLOCK_ID);
    room.core.player_mut(session_id).unwrap().add_block(block_id, 1);
    Ok(OpenWorldEvent::BlockMined { x, y, z, by: session_id.to_string() })
}

pub fn handle_place_block(room: &mut OpenWorldRoom, session_id: &SessionId, x: i32, y: i32, z: i32) -> Result<OpenWorldEvent, ServerError> {
    let (px, py, pz, selected) = {
        let player = room.core.player(session_id).ok_or_else(|| err("PLAYER_NOT_FOUND", "unknown player"))?;
        if player.dead {
            return Err(err("DEAD", "dead players cannot place blocks"));
        }
        (player.x, player.y, player.z, player.selected_block)
    };
    if l1(px, py, pz, x, y, z) > 5 {
        return Err(err("OUT_OF_RANGE", "target is not within reach"));
    }
    if room.world.get_block(x, y, z) != AIR_BLOCK_ID {
        return Err(err("OCCUPIED", "target is not clear"));
    }

    let player = room.core.player_mut(session_id).unwrap();
    let count = player.inventory.get(&selected).copied().unwrap_or(0);
    if count == 0 {
        return Err(err("NO_ITEM", "player does not have that block"));
    }
    player.inventory.insert(selected, count - 1);
    room.world.set_block(x, y, z, selected);
    Ok(OpenWorldEvent::BlockPlaced { x, y, z, block_id: selected, by: session_id.to_string() })
}

pub fn handle_chat(session_id: &SessionId, text: String) -> OpenWorldEvent {
    OpenWorldEvent::Chat { session_id: session_id.to_string(), text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::RoomCode;

    use crate::player::OpenWorldPlayer;
    use crate::room::OpenWorldRoom;

    fn room() -> OpenWorldRoom {
        let mut room = OpenWorldRoom::new(RoomCode("ABCDE".into()), "r".into(), SessionId("h".into()), 8, 1);
        room.core.insert_player(OpenWorldPlayer::new(SessionId("h".into()), "Host".into(), 0, (0, 70, 0)));
        room
    }

    #[test]
    fn mine_then_place_round_trips_block() {
        let mut room = room();
        room.world.set_block(1, 70, 0, 9);
        handle_mine(&mut room, &SessionId("h".into()), 1, 70, 0).unwrap();
        assert_eq!(room.world.get_block(1, 70, 0), AIR_BLOCK_ID);
        assert_eq!(room.core.player(&SessionId("h".into())).unwrap().inventory.get(&9).copied(), Some(1));

        room.core.player_mut(&SessionId("h".into())).unwrap().selected_block = 9;
        handle_place_block(&mut room, &SessionId("h".into()), 1, 70, 0).unwrap();
        assert_eq!(room.world.get_block(1, 70, 0), 9);
    }

    #[test]
    fn mine_out_of_range_is_rejected() {
        let mut room = room();
        assert!(handle_mine(&mut room, &SessionId("h".into()), 100, 70, 100).is_err());
    }

    #[test]
    fn mine_air_is_rejected() {
        let mut room = room();
        assert!(handle_mine(&mut room, &SessionId("h".into()), 0, 200, 0).is_err());
    }
}
