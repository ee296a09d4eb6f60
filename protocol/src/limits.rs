//! Field-size limits enforced by the dispatcher before a message reaches a Room
//! Manager (§4.4). Oversized fields are truncated, not rejected.

pub const DISPLAY_NAME_MAX_SHORT: usize = 16;
pub const DISPLAY_NAME_MAX_LONG: usize = 20;
pub const CHAT_MAX_SHORT: usize = 100;
pub const CHAT_MAX_LONG: usize = 256;
pub const ROOM_NAME_MAX: usize = 32;

/// Truncates `s` to at most `max` `char`s (not bytes, so UTF-8 boundaries stay valid).
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_on_char_boundary() {
        let s = "héllo world";
        assert_eq!(truncate_chars(s, 5), "héllo");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }
}
