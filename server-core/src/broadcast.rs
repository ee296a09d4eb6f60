//! C11: the Broadcast Engine (§4.13). An injected interface rather than the
//! teacher's callback-driven `onSendToPlayer`/`onBroadcastToRoom` notifications (§9
//! Design Notes): Room Managers depend on the [`Broadcaster`] trait, not the concrete
//! [`crate::connection::ConnectionRegistry`], so they stay testable against an
//! in-memory fake. Team and 3D-viewer membership are mode-specific, so the caller
//! supplies the recipient list; this module only owns the fan-out primitive.

use async_trait::async_trait;
use protocol::SessionId;

use crate::connection::{ConnectionRegistry, OutboundFrame};

#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Drops if the socket is not open (§4.13).
    async fn send_to_player(&self, session_id: &SessionId, frame: OutboundFrame);

    /// Serializes once, fans out sequentially to every id in `recipients` except
    /// `exclude` (§4.13).
    async fn broadcast_to(&self, recipients: &[SessionId], frame: OutboundFrame, exclude: Option<&SessionId>) {
        for sid in recipients {
            if Some(sid) == exclude {
                continue;
            }
            self.send_to_player(sid, frame.clone()).await;
        }
    }
}

#[async_trait]
impl Broadcaster for ConnectionRegistry {
    async fn send_to_player(&self, session_id: &SessionId, frame: OutboundFrame) {
        self.send_to(session_id, frame).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn sid(s: &str) -> SessionId {
        SessionId(s.to_string())
    }

    #[tokio::test]
    async fn broadcast_to_excludes_one_recipient() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        registry.register(sid("a"), tx_a).await;
        registry.register(sid("b"), tx_b).await;

        let recipients = vec![sid("a"), sid("b")];
        registry.broadcast_to(&recipients, "hi".to_string(), Some(&sid("a"))).await;

        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.recv().await.unwrap(), "hi");
    }
}
