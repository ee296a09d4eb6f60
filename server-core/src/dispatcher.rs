//! C8: the Dispatcher (§4.7). Routes a parsed client message to the owning Room
//! Manager by message-tag prefix. Each manager exposes a single `handle` entry point
//! (§4.7: "Each manager exposes a single `Handle(sessionId, msg) -> handled: bool`");
//! here that becomes an async trait method returning `Result<(), ServerError>` so
//! errors flow back to the dispatcher instead of being swallowed.

use std::sync::Arc;

use async_trait::async_trait;
use protocol::{ModeTag, ServerError, SessionId};
use serde_json::Value;

/// Implemented once per mode crate. A handler is permitted to call back into the
/// broadcast engine synchronously (§4.7).
#[async_trait]
pub trait ModeRouter: Send + Sync {
    async fn handle(&self, session_id: SessionId, msg_type: &str, payload: Value) -> Result<(), ServerError>;
}

/// Holds one [`ModeRouter`] per game mode and routes by [`protocol::route_tag`].
pub struct Dispatcher {
    board: Arc<dyn ModeRouter>,
    open_world: Arc<dyn ModeRouter>,
    arena: Arc<dyn ModeRouter>,
    warfront: Arc<dyn ModeRouter>,
    rhythm: Arc<dyn ModeRouter>,
}

impl Dispatcher {
    pub fn new(
        board: Arc<dyn ModeRouter>,
        open_world: Arc<dyn ModeRouter>,
        arena: Arc<dyn ModeRouter>,
        warfront: Arc<dyn ModeRouter>,
        rhythm: Arc<dyn ModeRouter>,
    ) -> Self {
        Dispatcher { board, open_world, arena, warfront, rhythm }
    }

    fn router_for(&self, tag: ModeTag) -> &Arc<dyn ModeRouter> {
        match tag {
            ModeTag::Board => &self.board,
            ModeTag::OpenWorld => &self.open_world,
            ModeTag::Arena => &self.arena,
            ModeTag::Warfront => &self.warfront,
            ModeTag::Rhythm => &self.rhythm,
        }
    }

    /// Parses `raw` as a JSON object with a string `type` tag, then routes it to the
    /// owning manager (§4.4, §4.7). Parsing/format failures are returned as
    /// `ServerError` rather than handled here, so the caller decides how to frame and
    /// send the error reply.
    pub async fn dispatch(&self, session_id: SessionId, raw: &str) -> Result<(), ServerError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| ServerError::invalid_json(e.to_string()))?;
        let Value::Object(ref obj) = value else {
            return Err(ServerError::invalid_format("frame must be a JSON object"));
        };
        let msg_type = match obj.get("type") {
            Some(Value::String(s)) => s.clone(),
            _ => return Err(ServerError::invalid_format("missing or non-string `type` field")),
        };

        let tag = protocol::route_tag(&msg_type);
        self.router_for(tag).handle(session_id, &msg_type, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRouter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModeRouter for CountingRouter {
        async fn handle(&self, _session_id: SessionId, _msg_type: &str, _payload: Value) -> Result<(), ServerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn router() -> Arc<dyn ModeRouter> {
        Arc::new(CountingRouter { calls: AtomicUsize::new(0) })
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(router(), router(), router(), router(), router())
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_json_error() {
        let dispatcher = dispatcher();
        let err = dispatcher.dispatch(SessionId("s".into()), "{not json").await.unwrap_err();
        assert_eq!(err.code, "INVALID_JSON");
    }

    #[tokio::test]
    async fn missing_type_field_is_invalid_format() {
        let dispatcher = dispatcher();
        let err = dispatcher.dispatch(SessionId("s".into()), "{}").await.unwrap_err();
        assert_eq!(err.code, "INVALID_FORMAT");
    }

    #[tokio::test]
    async fn routes_by_prefix_to_correct_manager() {
        let board = Arc::new(CountingRouter { calls: AtomicUsize::new(0) });
        let dispatcher = Dispatcher::new(
            board.clone(),
            router(),
            router(),
            router(),
            router(),
        );
        dispatcher
            .dispatch(SessionId("s".into()), r#"{"type":"mc_move"}"#)
            .await
            .unwrap();
        assert_eq!(board.calls.load(Ordering::SeqCst), 1);
    }
}
