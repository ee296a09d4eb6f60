//! C5: the Tick Scheduler (§4.9). `TICK_RATE` is mode-specific rather than
//! room-specific (§4.9: "10-20 Hz", varying per mode), so one [`TickScheduler`] runs
//! per mode manager and, on each fire, ticks every room of that mode still in
//! `playing` status — rather than spawning one timer per room. Long ticks are not
//! coalesced (tokio's default `MissedTickBehavior::Burst` matches §4.9: "the next fire
//! runs immediately after release").

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

pub struct TickScheduler {
    handle: JoinHandle<()>,
}

impl TickScheduler {
    /// Spawns a driver firing at `tick_rate_hz`; `on_tick` is expected to acquire the
    /// mode's room-map lock, run the mode tick over every `playing` room, and release
    /// it (§4.9 steps a-d).
    pub fn start<F, Fut>(tick_rate_hz: u32, mut on_tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let period = Duration::from_secs_f64(1.0 / tick_rate_hz.max(1) as f64);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                on_tick().await;
            }
        });
        TickScheduler { handle }
    }

    /// Cancels the driver (game end, room teardown, or graceful shutdown per §5).
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn fires_at_configured_rate() {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        let scheduler = TickScheduler::start(50, move || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(counter.load(Ordering::SeqCst) >= 3);
        scheduler.stop();
    }
}
