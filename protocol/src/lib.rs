//! Shared wire protocol, identifiers, and error vocabulary for the multiplayer room
//! engine. Every frame that crosses the WebSocket boundary is a single UTF-8 JSON
//! object carrying a string `type` tag (§4.4, §6); this crate defines that envelope
//! family, the opaque ids threaded through every layer, and the error taxonomy that
//! every public Room Manager operation returns instead of throwing across the
//! boundary (§4.8, §7).

pub mod envelope;
pub mod error;
pub mod ids;
pub mod limits;

pub use envelope::*;
pub use error::*;
pub use ids::*;

/// Buffer size for intra-process channels (broadcast fan-out, mpsc queues).
pub const CHANNEL_BUFFER_SIZE: usize = 256;

/// Tag-prefix routing table (§4.7, §6). The dispatcher strips the prefix and hands
/// the message to the owning Room Manager; no prefix routes to the rhythm manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTag {
    Board,
    OpenWorld,
    Arena,
    Warfront,
    Rhythm,
}

impl ModeTag {
    /// Short uppercase code used to build mode-prefixed error codes (e.g. `MC_JOIN_FAILED`).
    pub fn error_prefix(self) -> &'static str {
        match self {
            ModeTag::Board => "MC",
            ModeTag::OpenWorld => "MW",
            ModeTag::Arena => "FPS",
            ModeTag::Warfront => "WF",
            ModeTag::Rhythm => "RHY",
        }
    }
}

/// Routes a message tag to the owning mode by prefix (§4.7). `ms_`/`arena_` (switch-style)
/// are folded into the arena manager: §6 lists them as additional wire prefixes, but only
/// five Room Managers are specified as owning game modes (§1, §2).
pub fn route_tag(msg_type: &str) -> ModeTag {
    if msg_type.starts_with("mc_") {
        ModeTag::Board
    } else if msg_type.starts_with("mw_") {
        ModeTag::OpenWorld
    } else if msg_type.starts_with("fps_") || msg_type.starts_with("arena_") || msg_type.starts_with("ms_") {
        ModeTag::Arena
    } else if msg_type.starts_with("wf_") {
        ModeTag::Warfront
    } else {
        ModeTag::Rhythm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_by_prefix() {
        assert_eq!(route_tag("mc_move"), ModeTag::Board);
        assert_eq!(route_tag("mw_place_block"), ModeTag::OpenWorld);
        assert_eq!(route_tag("fps_shoot"), ModeTag::Arena);
        assert_eq!(route_tag("wf_capture"), ModeTag::Warfront);
        assert_eq!(route_tag("chat"), ModeTag::Rhythm);
        assert_eq!(route_tag("ready"), ModeTag::Rhythm);
    }
}
