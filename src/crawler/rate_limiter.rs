//! Sliding-window admission gate for outbound fetches

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Length of the rolling window requests are counted over
pub const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Limits fetches to `limit` per rolling minute
///
/// One limiter is shared by every worker of a crawl. Callers queue on a single
/// lock, so admissions are granted in arrival order.
#[derive(Debug)]
pub struct RateLimiter {
    limit: usize,
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            admitted: Mutex::new(VecDeque::new()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Waits until one more fetch fits in the window, then records it
    ///
    /// When the window is full the caller sleeps for
    /// `60s - (now - oldest) + 1s`, the time until the oldest admission
    /// leaves the window plus a one second margin.
    pub async fn admit(&self) {
        let mut admitted = self.admitted.lock().await;
        let now = Instant::now();
        prune(&mut admitted, now);

        if admitted.len() >= self.limit {
            if let Some(&oldest) = admitted.front() {
                let wait = RATE_WINDOW.saturating_sub(now.duration_since(oldest)) + Duration::from_secs(1);
                tracing::debug!(
                    "Rate limit of {}/min reached, waiting {:.1}s",
                    self.limit,
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
                prune(&mut admitted, Instant::now());
            }
        }

        admitted.push_back(Instant::now());
    }

    /// Number of admissions still inside the window
    pub async fn in_window(&self) -> usize {
        let mut admitted = self.admitted.lock().await;
        prune(&mut admitted, Instant::now());
        admitted.len()
    }
}

fn prune(admitted: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&oldest) = admitted.front() {
        if now.duration_since(oldest) >= RATE_WINDOW {
            admitted.pop_front();
        } else {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_under_limit_does_not_wait() {
        let limiter = RateLimiter::new(3);
        let start = Instant::now();
        for _ in 0..3 {
            limiter.admit().await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.in_window().await, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_window_waits_for_oldest_plus_margin() {
        let limiter = RateLimiter::new(2);
        let start = Instant::now();
        limiter.admit().await;
        tokio::time::advance(Duration::from_secs(10)).await;
        limiter.admit().await;

        limiter.admit().await;

        // Oldest admission at t=0 leaves the window at t=60, plus one second.
        assert_eq!(start.elapsed(), Duration::from_secs(61));
        assert_eq!(limiter.in_window().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_admissions_free_the_window() {
        let limiter = RateLimiter::new(1);
        limiter.admit().await;
        tokio::time::advance(RATE_WINDOW).await;

        let before = Instant::now();
        limiter.admit().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_between_tasks() {
        let limiter = Arc::new(RateLimiter::new(2));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.admit().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // Two admitted at t=0, the other two after the window rolls over.
        assert!(start.elapsed() >= Duration::from_secs(61));
        assert!(start.elapsed() < Duration::from_secs(62));
    }

    #[test]
    fn test_zero_limit_is_clamped() {
        assert_eq!(RateLimiter::new(0).limit(), 1);
    }
}
