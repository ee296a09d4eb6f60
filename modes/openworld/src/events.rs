//! Wire events the open-world tick pipeline and action handlers emit (§4.10-style
//! events generalized to `mw_*`, §6).

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum OpenWorldEvent {
    #[serde(rename = "mw_block_placed")]
    BlockPlaced { x: i32, y: i32, z: i32, block_id: u16, by: String },
    #[serde(rename = "mw_block_mined")]
    BlockMined { x: i32, y: i32, z: i32, by: String },
    #[serde(rename = "mw_player_moved")]
    PlayerMoved { session_id: String, x: f64, y: f64, z: f64 },
    #[serde(rename = "mw_player_died")]
    PlayerDied { session_id: String, cause: String },
    #[serde(rename = "mw_player_respawned")]
    PlayerRespawned { session_id: String, x: i32, y: i32, z: i32 },
    #[serde(rename = "mw_chat")]
    Chat { session_id: String, text: String },
}

impl OpenWorldEvent {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(json!({"type": "error_serializing"}))
    }
}
