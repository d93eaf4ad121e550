use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::debug;

/// A repeating tick task that stops by itself after `from` ticks.
///
/// Each tick is delivered as an event on the owner's channel; the owner
/// keeps the remaining count. Dropping or cancelling the handle aborts the
/// task, so no tick is sent after `cancel` returns.
#[derive(Debug)]
pub struct Countdown {
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn spawn<E, F>(from: u32, period: Duration, tx: UnboundedSender<E>, tick: F) -> Self
    where
        E: Send + 'static,
        F: Fn() -> E + Send + 'static,
    {
        debug!(from, ?period, "countdown started");
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            for _ in 0..from {
                interval.tick().await;
                if tx.send(tick()).is_err() {
                    // receiver gone, nobody to tick for
                    break;
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("countdown cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}
