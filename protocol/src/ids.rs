//! Opaque identifiers (§3). Newtypes keep session/room/token ids from being mixed up
//! at call sites the way the teacher keeps `u16` client ids distinct from room-code
//! strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A server-generated, opaque session id of the form `player_<millis>_<base36>` (§4.5).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SessionId {
    pub fn generate(millis: u128, rand_suffix: &str) -> Self {
        SessionId(format!("player_{millis}_{rand_suffix}"))
    }
}

/// A 5-character uppercase alphanumeric room code, excluding ambiguous characters
/// `0/O/1/I` (§3, B1).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomCode(pub String);

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The alphabet room codes are drawn from: no `0`, `O`, `1`, `I`.
pub const ROOM_CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
pub const ROOM_CODE_LEN: usize = 5;

impl RoomCode {
    /// True iff `s` is a well-formed room code (B1).
    pub fn is_well_formed(s: &str) -> bool {
        s.len() == ROOM_CODE_LEN && s.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b))
    }
}

/// An opaque reconnect token of the form `reconnect_<millis>_<base36>` (§4.6).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReconnectToken(pub String);

impl fmt::Display for ReconnectToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ReconnectToken {
    pub fn generate(millis: u128, rand_suffix: &str) -> Self {
        ReconnectToken(format!("reconnect_{millis}_{rand_suffix}"))
    }
}
