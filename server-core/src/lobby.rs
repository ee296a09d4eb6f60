//! C10: the Lobby Orchestrator and per-mode matchmaking queues (§4.14). Countdown
//! timers are owned here, not by clients ("cancellation not supported once started").

use std::future::Future;
use std::time::Duration;

use protocol::SessionId;
use tokio::task::JoinHandle;

use crate::connection::now_millis;

/// Drives a `countdown { count }` sequence at 1 Hz from `from` down to 1, then invokes
/// `on_finish` (expected to call the mode's `BeginPlaying` and emit `game_started`).
pub struct CountdownHandle {
    handle: JoinHandle<()>,
}

impl CountdownHandle {
    pub fn start<F, Fut, G, Fut2>(from: u32, mut on_tick: F, on_finish: G) -> Self
    where
        F: FnMut(u32) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
        G: FnOnce() -> Fut2 + Send + 'static,
        Fut2: Future<Output = ()> + Send,
    {
        let handle = tokio::spawn(async move {
            let mut count = from.max(1);
            loop {
                on_tick(count).await;
                if count == 1 {
                    break;
                }
                tokio::time::sleep(Duration::from_secs(1)).await;
                count -= 1;
            }
            on_finish().await;
        });
        CountdownHandle { handle }
    }

    /// Aborts an in-flight countdown. Used only by room teardown / shutdown, never by
    /// a client request (§4.14: "cancellation not supported once started").
    pub fn abort(self) {
        self.handle.abort();
    }
}

/// A queued matchmaking entry (§4.14: `{ sid, name, points?, queuedAt }`).
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedPlayer {
    pub session_id: SessionId,
    pub name: String,
    pub points: Option<i32>,
    pub queued_at_millis: u64,
}

impl QueuedPlayer {
    pub fn new(session_id: SessionId, name: String, points: Option<i32>) -> Self {
        QueuedPlayer { session_id, name, points, queued_at_millis: now_millis() }
    }
}

/// Per-mode queue (rhythm ranked, arena FFA) living under the orchestrator (§4.14).
#[derive(Default)]
pub struct MatchmakingQueue {
    queue: Vec<QueuedPlayer>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        MatchmakingQueue::default()
    }

    pub fn enqueue(&mut self, player: QueuedPlayer) {
        self.queue.push(player);
    }

    pub fn remove(&mut self, session_id: &SessionId) {
        self.queue.retain(|p| &p.session_id != session_id);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Finds the first pair satisfying the match criteria (§4.14): within
    /// `point_range` of each other for ranked queues, or any two players when
    /// `point_range` is `None` (arena FFA). Removes both from the queue on match.
    pub fn find_match(&mut self, point_range: Option<i32>) -> Option<(QueuedPlayer, QueuedPlayer)> {
        for i in 0..self.queue.len() {
            for j in (i + 1)..self.queue.len() {
                let is_match = match point_range {
                    None => true,
                    Some(range) => match (self.queue[i].points, self.queue[j].points) {
                        (Some(a), Some(b)) => (a - b).abs() <= range,
                        _ => false,
                    },
                };
                if is_match {
                    let b = self.queue.remove(j);
                    let a = self.queue.remove(i);
                    return Some((a, b));
                }
            }
        }
        None
    }

    /// Evicts every entry that has waited at least `timeout`, for the AI-fallback path
    /// on ranked queues (§4.14, scenario 6).
    pub fn evict_timed_out(&mut self, timeout: Duration) -> Vec<QueuedPlayer> {
        let now = now_millis();
        let timeout_millis = timeout.as_millis() as u64;
        let (expired, remaining): (Vec<_>, Vec<_>) = self
            .queue
            .drain(..)
            .partition(|p| now.saturating_sub(p.queued_at_millis) >= timeout_millis);
        self.queue = remaining;
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(s: &str) -> SessionId {
        SessionId(s.to_string())
    }

    #[test]
    fn ranked_match_requires_point_range() {
        let mut q = MatchmakingQueue::new();
        q.enqueue(QueuedPlayer::new(sid("a"), "A".into(), Some(1000)));
        q.enqueue(QueuedPlayer::new(sid("b"), "B".into(), Some(1500)));
        assert!(q.find_match(Some(100)).is_none());
        assert!(q.find_match(Some(1000)).is_some());
    }

    #[test]
    fn arena_matches_any_pair() {
        let mut q = MatchmakingQueue::new();
        q.enqueue(QueuedPlayer::new(sid("a"), "A".into(), None));
        q.enqueue(QueuedPlayer::new(sid("b"), "B".into(), None));
        assert!(q.find_match(None).is_some());
        assert!(q.is_empty());
    }

    #[test]
    fn single_entry_never_matches() {
        let mut q = MatchmakingQueue::new();
        q.enqueue(QueuedPlayer::new(sid("a"), "A".into(), None));
        assert!(q.find_match(None).is_none());
    }

    #[tokio::test]
    async fn countdown_ticks_down_to_one_then_finishes() {
        use std::sync::atomic::{AtomicU32, AtomicBool, Ordering};
        use std::sync::Arc;

        let ticks = Arc::new(AtomicU32::new(0));
        let finished = Arc::new(AtomicBool::new(false));
        let ticks_clone = ticks.clone();
        let finished_clone = finished.clone();

        let handle = CountdownHandle::start(
            3,
            move |count| {
                ticks_clone.store(count, Ordering::SeqCst);
                async move {}
            },
            move || {
                finished_clone.store(true, Ordering::SeqCst);
                async move {}
            },
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        handle.abort();
    }
}
