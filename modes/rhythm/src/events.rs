//! Wire events the rhythm tick pipeline and matchmaking emit (§6, §4.14).

use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum RhythmEvent {
    #[serde(rename = "note_spawned")]
    NoteSpawned { index: u32, expected_tick: u64 },
    #[serde(rename = "note_judged")]
    NoteJudged { session_id: String, index: u32, judgement: &'static str, score: i64, combo: u32 },
    #[serde(rename = "chart_complete")]
    ChartComplete { scores: Vec<(String, i64)> },
    #[serde(rename = "chat")]
    Chat { session_id: String, text: String },
}

impl RhythmEvent {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(json!({"type": "error_serializing"}))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum MatchmakingEvent {
    #[serde(rename = "ranked_match_found")]
    RankedMatchFound { code: String, is_ai: bool, game_seed: u32 },
}

impl MatchmakingEvent {
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(json!({"type": "error_serializing"}))
    }
}
