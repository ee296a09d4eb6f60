//! C9: the Reconnect Broker (§4.6). Owns reconnect tokens, independent of the room
//! managers and the connection registry (§3 Ownership).

use std::collections::HashMap;
use std::time::Duration;

use protocol::{ReconnectToken, SessionId};

use crate::connection::now_millis;

#[derive(Debug, Clone)]
struct TokenRecord {
    session_id: SessionId,
    expires_at_millis: u64,
}

/// Token issuance, grace-period expiry, and rotation (§4.6). A token may be consumed
/// (via [`ReconnectBroker::take`]) at most once (P4).
#[derive(Default)]
pub struct ReconnectBroker {
    tokens: HashMap<ReconnectToken, TokenRecord>,
}

impl ReconnectBroker {
    pub fn new() -> Self {
        ReconnectBroker::default()
    }

    /// Issues a fresh token bound to `session_id`, valid for `grace` from now (§4.6 step 1).
    pub fn issue(&mut self, session_id: SessionId, grace: Duration, rand_suffix: &str) -> ReconnectToken {
        let now = now_millis();
        let token = ReconnectToken::generate(now as u128, rand_suffix);
        self.tokens.insert(
            token.clone(),
            TokenRecord { session_id, expires_at_millis: now + grace.as_millis() as u64 },
        );
        token
    }

    /// Consumes `token` if it exists and has not expired, returning the bound session
    /// id. The token is removed either way (existence is a one-shot precondition; P4,
    /// L5). Returns `None` on missing or expired token.
    pub fn take(&mut self, token: &ReconnectToken) -> Option<SessionId> {
        let record = self.tokens.remove(token)?;
        if now_millis() > record.expires_at_millis {
            None
        } else {
            Some(record.session_id)
        }
    }

    pub fn revoke(&mut self, token: &ReconnectToken) {
        self.tokens.remove(token);
    }

    /// Revokes every token still bound to `session_id` (used when a session leaves
    /// explicitly rather than reconnecting).
    pub fn revoke_for_session(&mut self, session_id: &SessionId) {
        self.tokens.retain(|_, record| &record.session_id != session_id);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId(s.to_string())
    }

    #[test]
    fn issue_then_take_returns_bound_session() {
        let mut broker = ReconnectBroker::new();
        let token = broker.issue(sid("p1"), Duration::from_secs(60), "abc");
        assert_eq!(broker.take(&token), Some(sid("p1")));
    }

    #[test]
    fn token_is_single_use() {
        let mut broker = ReconnectBroker::new();
        let token = broker.issue(sid("p1"), Duration::from_secs(60), "abc");
        assert_eq!(broker.take(&token), Some(sid("p1")));
        assert_eq!(broker.take(&token), None);
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut broker = ReconnectBroker::new();
        let token = broker.issue(sid("p1"), Duration::from_millis(0), "abc");
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(broker.take(&token), None);
    }

    #[test]
    fn revoke_for_session_drops_its_tokens() {
        let mut broker = ReconnectBroker::new();
        broker.issue(sid("p1"), Duration::from_secs(60), "a1");
        broker.issue(sid("p2"), Duration::from_secs(60), "a2");
        broker.revoke_for_session(&sid("p1"));
        assert_eq!(broker.len(), 1);
    }
}
