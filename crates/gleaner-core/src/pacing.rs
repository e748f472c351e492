//! Inter-request pacing.
//!
//! Target sites rate-limit and fingerprint burst traffic, so attempts are
//! spaced out like a human reader: a minimum interval between requests plus
//! a random jitter component. Expressed as a rate budget of one request per
//! interval; a zero interval disables pacing (used by tests).

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tracing::debug;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-source politeness gate: at most one request per `min_interval`.
#[derive(Clone)]
pub struct Pacer {
    limiter: Option<Arc<DirectRateLimiter>>,
    min_interval: Duration,
}

impl Pacer {
    pub fn new(min_interval: Duration) -> Self {
        if min_interval.is_zero() {
            return Self {
                limiter: None,
                min_interval,
            };
        }

        let period = min_interval.max(Duration::from_millis(1));
        let quota = Quota::with_period(period)
            .expect("period is always greater than zero")
            .allow_burst(NonZeroU32::new(1).expect("burst of one is non-zero"));

        Self {
            limiter: Some(Arc::new(RateLimiter::direct(quota))),
            min_interval,
        }
    }

    /// Tries to acquire rate budget; the recommended wait is returned when
    /// budget is unavailable.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        limiter.check().map_err(|not_until| {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            wait.max(Duration::from_millis(1))
        })
    }

    /// Sleeps until budget is available, with jitter on top of each wait.
    pub async fn wait(&self) {
        loop {
            match self.try_acquire() {
                Ok(()) => return,
                Err(delay) => {
                    let jitter_ms = (self.min_interval.as_millis() / 2).max(1) as u64;
                    let jitter = Duration::from_millis(fastrand::u64(0..=jitter_ms));
                    debug!(wait_ms = (delay + jitter).as_millis() as u64, "pacing request");
                    tokio::time::sleep(delay + jitter).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_never_blocks() {
        let pacer = Pacer::new(Duration::ZERO);
        for _ in 0..100 {
            assert!(pacer.try_acquire().is_ok());
        }
    }

    #[test]
    fn budget_is_one_request_per_interval() {
        let pacer = Pacer::new(Duration::from_secs(60));

        assert!(pacer.try_acquire().is_ok());
        let wait = pacer.try_acquire().expect_err("second request is paced");
        assert!(wait > Duration::ZERO);
    }

    #[tokio::test]
    async fn wait_returns_once_budget_is_back() {
        let pacer = Pacer::new(Duration::from_millis(20));

        pacer.wait().await;
        // Second wait sleeps roughly one interval and returns.
        pacer.wait().await;
    }
}
