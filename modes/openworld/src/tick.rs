//! The open-world tick pipeline: periodic per-player snapshot of nearby players
//! (§4.9, §4.12 visibility culling generalized to the X/Z plane).

use serde_json::{json, Value};

use crate::constants::{STATE_UPDATE_INTERVAL_TICKS, VISION_RADIUS};
use crate::room::OpenWorldRoom;

#[derive(Default)]
pub struct TickOutcome {
    pub snapshots: Vec<(protocol::SessionId, Value)>,
}

pub fn step(room: &mut OpenWorldRoom) -> TickOutcome {
    room.core.tick += 1;
    let tick = room.core.tick;
    let mut out = TickOutcome::default();

    if tick % STATE_UPDATE_INTERVAL_TICKS != 0 {
        return out;
    }

    let players = room.core.players();
    for viewer in players {
        let visible: Vec<Value> = players
            .iter()
            .filter(|p| p.session_id != viewer.session_id)
            .filter(|p| l1_xz(viewer.x, viewer.z, p.x, p.z) <= VISION_RADIUS + 2)
            .map(|p| json!({"sessionId": p.session_id.to_string(), "x": p.x, "y": p.y, "z": p.z, "health": p.health, "dead": p.dead}))
            .collect();
        out.snapshots.push((
            viewer.session_id.clone(),
            json!({
                "type": "mw_state_update",
                "tick": tick,
                "self": {"x": viewer.x, "y": viewer.y, "z": viewer.z, "health": viewer.health},
                "players": visible,
            }),
        ));
    }
    out
}

fn l1_xz(ax: i32, az: i32, bx: i32, bz: i32) -> i32 {
    (ax - bx).abs() + (az - bz).abs()
}
