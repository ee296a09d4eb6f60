//! Server -> client envelopes for the session/room lifecycle family (§6). Mode-specific
//! simulation events (`*_tile_mined`, `wf_territory_update`, ...) are defined in their
//! owning mode crate, since their payload shape is mode-specific; these are the frames
//! every mode shares verbatim.

use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct Connected {
    pub r#type: &'static str,
    pub session_id: String,
    pub server_time: u64,
}

impl Connected {
    pub fn new(session_id: &str, server_time_millis: u64) -> Self {
        Connected {
            r#type: "connected",
            session_id: session_id.to_string(),
            server_time: server_time_millis,
        }
    }
}

#[derive(Serialize)]
pub struct RoomCreated {
    pub r#type: &'static str,
    pub code: String,
    pub reconnect_token: String,
    pub player: Value,
}

#[derive(Serialize)]
pub struct JoinedRoom {
    pub r#type: &'static str,
    pub code: String,
    pub reconnect_token: String,
    pub room_state: Value,
}

#[derive(Serialize)]
pub struct PlayerJoined {
    pub r#type: &'static str,
    pub player: Value,
}

#[derive(Serialize)]
pub struct PlayerLeft {
    pub r#type: &'static str,
    pub session_id: String,
    pub reason: &'static str,
}

#[derive(Serialize)]
pub struct PlayerReady {
    pub r#type: &'static str,
    pub session_id: String,
    pub ready: bool,
}

#[derive(Serialize)]
pub struct Countdown {
    pub r#type: &'static str,
    pub count: u32,
}

#[derive(Serialize)]
pub struct GameStarted {
    pub r#type: &'static str,
    pub seed: u32,
    pub timestamp: u64,
}

#[derive(Serialize)]
pub struct Reconnected {
    pub r#type: &'static str,
    pub reconnect_token: String,
    pub room_state: Value,
}

#[derive(Serialize)]
pub struct ServerShutdown {
    pub r#type: &'static str,
    pub reason: &'static str,
}

impl Default for ServerShutdown {
    fn default() -> Self {
        ServerShutdown {
            r#type: "server_shutdown",
            reason: "graceful",
        }
    }
}

#[derive(Serialize)]
pub struct OnlineCount {
    pub r#type: &'static str,
    pub count: usize,
}

#[derive(Serialize)]
pub struct Ping {
    pub r#type: &'static str,
    pub timestamp: u64,
}

#[derive(Serialize)]
pub struct RoomListEntry {
    pub code: String,
    pub name: String,
    pub players: u16,
    pub max_players: u16,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct RoomList {
    pub r#type: &'static str,
    pub rooms: Vec<RoomListEntry>,
}
