//! Wire events the arena tick pipeline and action handlers emit (§6).

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ArenaEvent {
    #[serde(rename = "fps_player_moved")]
    PlayerMoved { session_id: String, x: f64, y: f64, z: f64 },
    #[serde(rename = "fps_shot_fired")]
    ShotFired { session_id: String, target: Option<String>, hit: bool },
    #[serde(rename = "fps_player_died")]
    PlayerDied { session_id: String, killer: Option<String> },
    #[serde(rename = "fps_player_respawned")]
    PlayerRespawned { session_id: String, x: f64, y: f64, z: f64 },
    #[serde(rename = "fps_match_over")]
    MatchOver { winner: String },
    #[serde(rename = "fps_chat")]
    Chat { session_id: String, text: String },
}

impl ArenaEvent {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(json!({"type": "error_serializing"}))
    }
}
