//! Serialized, rate-limited dispatch of outbound API requests.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// A single-lane request gate.
///
/// Requests run one at a time in arrival order (the internal mutex is fair),
/// with a fixed minimum delay between the completion of one request and the
/// dispatch of the next. Concurrent resolution branches therefore share one
/// outbound pipeline rather than hammering the upstream API in parallel.
///
/// There is no per-request timeout; a hung request stalls the lane.
#[derive(Debug)]
pub struct RequestScheduler {
    interval: Duration,
    last_finished: Mutex<Option<Instant>>,
}

impl RequestScheduler {
    /// Create a scheduler with the given minimum inter-request delay.
    pub fn new(interval: Duration) -> Self {
        RequestScheduler {
            interval,
            last_finished: Mutex::new(None),
        }
    }

    /// Run `fut` once the lane is free and the inter-request delay has
    /// elapsed, returning its output.
    pub async fn run<F, T>(&self, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut last = self.last_finished.lock().await;
        if let Some(finished) = *last {
            let ready_at = finished + self.interval;
            let now = Instant::now();
            if ready_at > now {
                sleep(ready_at - now).await;
            }
        }
        let out = fut.await;
        *last = Some(Instant::now());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_spaces_requests_by_interval() {
        let scheduler = RequestScheduler::new(Duration::from_millis(100));
        let start = Instant::now();
        scheduler.run(async {}).await;
        scheduler.run(async {}).await;
        scheduler.run(async {}).await;
        // First request is immediate; the next two each wait out the gap.
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_request_in_flight_at_a_time() {
        let scheduler = RequestScheduler::new(Duration::from_millis(10));
        let active = AtomicUsize::new(0);
        let run = || {
            scheduler.run(async {
                assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            })
        };
        tokio::join!(run(), run(), run());
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_future_output() {
        let scheduler = RequestScheduler::new(Duration::from_millis(1));
        let value = scheduler.run(async { 41 + 1 }).await;
        assert_eq!(value, 42);
    }
}
