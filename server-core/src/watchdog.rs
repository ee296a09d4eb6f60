//! Stale-room GC, generalizing the teacher's `cleanup_dead_rooms` watchdog task.
//! Rooms with zero players must be torn down within one tick (I3); this periodic
//! sweep is the fallback for rooms a handler path failed to tear down directly, and
//! the place reconnect-grace expiry is enforced for rooms nobody revisited.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

pub struct Watchdog {
    handle: JoinHandle<()>,
}

impl Watchdog {
    /// Spawns a periodic sweep. `sweep` is expected to lock the mode's room map,
    /// remove empty/dead rooms, and release the lock — mirroring the teacher's
    /// `cleanup_dead_rooms` (§2 "this is a fallback solution; things should be handled
    /// internally otherwise").
    pub fn start<F, Fut>(interval: Duration, mut sweep: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                sweep().await;
            }
        });
        Watchdog { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
