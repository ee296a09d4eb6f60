//! Wire events the board tick pipeline and action handlers emit (§4.10, §6). Kept
//! distinct from `protocol::envelope` since these payloads are board-specific.

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum BoardEvent {
    #[serde(rename = "mc_tile_mined")]
    TileMined { x: i32, y: i32, new_block: String, by: String },
    #[serde(rename = "mc_block_placed")]
    BlockPlaced { x: i32, y: i32, block_id: String, by: String },
    #[serde(rename = "mc_player_moved")]
    PlayerMoved { session_id: String, x: i32, y: i32 },
    #[serde(rename = "mc_player_died")]
    PlayerDied { session_id: String, cause: String },
    #[serde(rename = "mc_player_respawned")]
    PlayerRespawned { session_id: String, x: i32, y: i32 },
    #[serde(rename = "mc_mob_spawned")]
    MobSpawned { id: u64, kind: String, x: i32, y: i32 },
    #[serde(rename = "mc_mob_died")]
    MobDied { id: u64 },
    #[serde(rename = "mc_anomaly_started")]
    AnomalyStarted { side: String },
    #[serde(rename = "mc_anomaly_ended")]
    AnomalyEnded { side: String },
    #[serde(rename = "mc_chat")]
    Chat { session_id: String, text: String },
}

impl BoardEvent {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(json!({"type": "error_serializing"}))
    }
}
