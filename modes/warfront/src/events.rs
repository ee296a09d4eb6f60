//! Wire events the warfront tick pipeline and role actions emit (§4.11, §6).

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum WarfrontEvent {
    #[serde(rename = "wf_territory_update")]
    TerritoryUpdate { cells: Value, team_counts: Value },
    #[serde(rename = "wf_resources_update")]
    ResourcesUpdate { team_id: String, resources: Value },
    #[serde(rename = "wf_effect_applied")]
    EffectApplied { kind: String, target: String },
    #[serde(rename = "wf_effect_expired")]
    EffectExpired { target: String, status: String },
    #[serde(rename = "wf_team_scores")]
    TeamScores { scores: Value },
    #[serde(rename = "wf_player_died")]
    PlayerDied { session_id: String, killer: Option<String> },
    #[serde(rename = "wf_game_over")]
    GameOver { winner: String },
}

impl WarfrontEvent {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(json!({"type": "error_serializing"}))
    }
}
