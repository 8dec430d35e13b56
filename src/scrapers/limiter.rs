use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Minimum spacing between outbound page loads.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(2000);

/// Process-wide pacing for outbound requests.
///
/// Clones share one "last dispatch" instant, so every fetcher holding a
/// clone observes the same interval. `wait_turn` keeps the lock across the
/// whole check-sleep-mark sequence; two concurrent callers can never both
/// read a stale instant and dispatch early.
#[derive(Debug, Clone)]
pub struct RequestPacer {
    min_interval: Duration,
    last_dispatch: Arc<Mutex<Option<Instant>>>,
}

impl Default for RequestPacer {
    fn default() -> Self {
        Self::new(MIN_REQUEST_INTERVAL)
    }
}

impl RequestPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Arc::new(Mutex::new(None)),
        }
    }

    /// Suspend until this caller may dispatch, then mark the dispatch time.
    ///
    /// Contention is queueing on the internal lock, never an error. Returns
    /// the recorded dispatch instant.
    pub async fn wait_turn(&self) -> Instant {
        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!("pacing request, waiting {:?}", wait);
                tokio::time::sleep(wait).await;
            }
        }
        let now = Instant::now();
        *last = Some(now);
        now
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}
