//! C7: the Connection Registry (§4.5). Player-id keyed WebSocket handles, liveness
//! flags, and profile metadata, sharded behind one short-held lock never held across
//! network I/O (§5).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use protocol::SessionId;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};

/// An outbound frame, already JSON-serialized to text (§4.4: "outbound frames are
/// JSON-serialized once per recipient").
pub type OutboundFrame = String;

/// The per-session record the registry owns (§3 Player Session).
struct Session {
    sender: mpsc::Sender<OutboundFrame>,
    alive: bool,
    last_activity_millis: u64,
}

/// Player-id keyed WebSocket handle table plus liveness bookkeeping. The WebSocket
/// write task on the other end of `sender` is the sole owner of the actual socket
/// handle, matching the ownership rule in §3 ("the Connection Registry is the sole
/// owner of the WebSocket handle").
#[derive(Default)]
pub struct ConnectionRegistry {
    sessions: Mutex<HashMap<SessionId, Session>>,
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        ConnectionRegistry::default()
    }

    /// Registers a freshly-upgraded connection under a new session id (§4.5 step b/c).
    pub async fn register(&self, session_id: SessionId, sender: mpsc::Sender<OutboundFrame>) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            session_id,
            Session { sender, alive: true, last_activity_millis: now_millis() },
        );
    }

    pub async fn remove(&self, session_id: &SessionId) {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(session_id);
    }

    pub async fn contains(&self, session_id: &SessionId) -> bool {
        self.sessions.lock().await.contains_key(session_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// A client `pong` (application-level or native WS) sets `alive=true` (§4.5).
    pub async fn mark_alive(&self, session_id: &SessionId) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(session_id) {
            session.alive = true;
            session.last_activity_millis = now_millis();
        }
    }

    pub async fn touch(&self, session_id: &SessionId) {
        self.mark_alive(session_id).await;
    }

    /// Best-effort send: drops silently if the socket is not open (§4.13).
    pub async fn send_to(&self, session_id: &SessionId, frame: OutboundFrame) {
        let sender = {
            let sessions = self.sessions.lock().await;
            sessions.get(session_id).map(|s| s.sender.clone())
        };
        if let Some(sender) = sender {
            let _ = sender.send(frame).await;
        }
    }

    pub async fn broadcast(&self, frame: OutboundFrame, exclude: Option<&SessionId>) {
        let senders: Vec<_> = {
            let sessions = self.sessions.lock().await;
            sessions
                .iter()
                .filter(|(sid, _)| exclude != Some(sid))
                .map(|(_, s)| s.sender.clone())
                .collect()
        };
        for sender in senders {
            let _ = sender.send(frame.clone()).await;
        }
    }

    /// Heartbeat sweep (§4.5): sessions still `alive` are flipped to not-alive and sent
    /// a `ping`; sessions that were already not-alive are considered timed out and
    /// returned to the caller for disconnection.
    pub async fn sweep_heartbeat(&self) -> Vec<SessionId> {
        let mut timed_out = Vec::new();
        let ping_targets: Vec<_> = {
            let mut sessions = self.sessions.lock().await;
            let mut pings = Vec::new();
            for (sid, session) in sessions.iter_mut() {
                if session.alive {
                    session.alive = false;
                    pings.push((sid.clone(), session.sender.clone()));
                } else {
                    timed_out.push(sid.clone());
                }
            }
            pings
        };
        let ping = Value::Object(
            [
                ("type".to_string(), Value::String("ping".to_string())),
                ("timestamp".to_string(), Value::from(now_millis())),
            ]
            .into_iter()
            .collect(),
        );
        let frame = ping.to_string();
        for (_, sender) in ping_targets {
            let _ = sender.send(frame.clone()).await;
        }
        timed_out
    }

    pub async fn last_activity_millis(&self, session_id: &SessionId) -> Option<u64> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .map(|s| s.last_activity_millis)
    }
}

pub type SharedConnectionRegistry = Arc<ConnectionRegistry>;

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId(s.to_string())
    }

    #[tokio::test]
    async fn register_then_send_delivers_frame() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::channel(8);
        registry.register(sid("a"), tx).await;
        registry.send_to(&sid("a"), "hello".to_string()).await;
        assert_eq!(rx.recv().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn send_to_unknown_session_is_noop() {
        let registry = ConnectionRegistry::new();
        registry.send_to(&sid("ghost"), "hi".to_string()).await;
    }

    #[tokio::test]
    async fn heartbeat_sweep_pings_once_then_reports_timeout() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::channel(8);
        registry.register(sid("a"), tx).await;

        let timed_out = registry.sweep_heartbeat().await;
        assert!(timed_out.is_empty());
        assert_eq!(rx.recv().await.unwrap().contains("ping"), true);

        let timed_out = registry.sweep_heartbeat().await;
        assert_eq!(timed_out, vec![sid("a")]);
    }

    #[tokio::test]
    async fn pong_resets_liveness_before_next_sweep() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::channel(8);
        registry.register(sid("a"), tx).await;
        registry.sweep_heartbeat().await;
        registry.mark_alive(&sid("a")).await;
        let timed_out = registry.sweep_heartbeat().await;
        assert!(timed_out.is_empty());
    }

    #[tokio::test]
    async fn broadcast_excludes_given_session() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        registry.register(sid("a"), tx_a).await;
        registry.register(sid("b"), tx_b).await;
        registry.broadcast("msg".to_string(), Some(&sid("a"))).await;
        assert_eq!(rx_b.recv().await.unwrap(), "msg");
        assert!(rx_a.try_recv().is_err());
    }
}
