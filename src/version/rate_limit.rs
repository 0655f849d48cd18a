//! Advisory request throttling for the metadata provider
//!
//! The limiter never drops or queues requests; it only delays the caller.
//! Waiting, sending and recording the response happen inside one critical
//! section, so concurrent callers cannot both act on a stale budget.

use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::config::{
    DEFAULT_MIN_REQUEST_INTERVAL_MS, DEFAULT_RATE_LIMIT, DEFAULT_RATE_LIMIT_LOW_WATERMARK,
};

/// Budget information reported by the provider alongside a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    /// Time until the budget is replenished
    pub reset_after: Duration,
}

#[derive(Debug)]
struct RateLimitState {
    limit: u32,
    remaining: u32,
    reset_at: Option<Instant>,
    last_request: Option<Instant>,
}

pub struct RateLimiter {
    state: Mutex<RateLimitState>,
    min_interval: Duration,
    low_watermark: u32,
}

impl RateLimiter {
    pub fn new(min_interval: Duration, low_watermark: u32) -> Self {
        Self {
            state: Mutex::new(RateLimitState {
                limit: DEFAULT_RATE_LIMIT,
                remaining: DEFAULT_RATE_LIMIT,
                reset_at: None,
                last_request: None,
            }),
            min_interval,
            low_watermark,
        }
    }

    /// Wait until a request may be sent and return the permit for it.
    ///
    /// The permit holds the limiter until it is dropped; record the response's
    /// budget on it before dropping.
    pub async fn acquire(&self) -> RequestPermit<'_> {
        let state = self.state.lock().await;

        let wait = wait_time(&state, Instant::now(), self.min_interval, self.low_watermark);
        if !wait.is_zero() {
            debug!(
                "Rate limiter delaying request by {:?} ({} of {} requests remaining)",
                wait, state.remaining, state.limit
            );
            sleep(wait).await;
        }

        RequestPermit { state }
    }

    /// Remaining request budget as last reported by the provider
    pub async fn remaining(&self) -> u32 {
        self.state.lock().await.remaining
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_MIN_REQUEST_INTERVAL_MS),
            DEFAULT_RATE_LIMIT_LOW_WATERMARK,
        )
    }
}

/// Exclusive right to send one request
pub struct RequestPermit<'a> {
    state: MutexGuard<'a, RateLimitState>,
}

impl RequestPermit<'_> {
    /// Record the budget reported by the response to this request
    pub fn record(&mut self, info: RateLimitInfo) {
        self.state.limit = info.limit;
        self.state.remaining = info.remaining;
        self.state.reset_at = Some(Instant::now() + info.reset_after);
    }
}

impl Drop for RequestPermit<'_> {
    fn drop(&mut self) {
        self.state.last_request = Some(Instant::now());
    }
}

fn wait_time(
    state: &RateLimitState,
    now: Instant,
    min_interval: Duration,
    low_watermark: u32,
) -> Duration {
    if state.remaining < low_watermark {
        if let Some(reset_at) = state.reset_at {
            if reset_at > now {
                return reset_at - now;
            }
        }
    }

    match state.last_request {
        Some(last) => min_interval.saturating_sub(now.saturating_duration_since(last)),
        None => Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(100);

    fn state(remaining: u32, reset_at: Option<Instant>, last: Option<Instant>) -> RateLimitState {
        RateLimitState {
            limit: 300,
            remaining,
            reset_at,
            last_request: last,
        }
    }

    #[test]
    fn wait_time_is_zero_for_first_request() {
        let now = Instant::now();
        assert_eq!(wait_time(&state(300, None, None), now, INTERVAL, 10), Duration::ZERO);
    }

    #[test]
    fn wait_time_enforces_min_interval() {
        let now = Instant::now();
        let last = now - Duration::from_millis(30);

        assert_eq!(
            wait_time(&state(300, None, Some(last)), now, INTERVAL, 10),
            Duration::from_millis(70)
        );
    }

    #[test]
    fn wait_time_is_zero_after_min_interval_elapsed() {
        let now = Instant::now();
        let last = now - Duration::from_millis(250);

        assert_eq!(
            wait_time(&state(300, None, Some(last)), now, INTERVAL, 10),
            Duration::ZERO
        );
    }

    #[test]
    fn wait_time_waits_for_reset_when_budget_is_low() {
        let now = Instant::now();
        let reset_at = now + Duration::from_secs(30);

        assert_eq!(
            wait_time(&state(9, Some(reset_at), None), now, INTERVAL, 10),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn wait_time_ignores_reset_at_watermark() {
        let now = Instant::now();
        let reset_at = now + Duration::from_secs(30);

        assert_eq!(
            wait_time(&state(10, Some(reset_at), None), now, INTERVAL, 10),
            Duration::ZERO
        );
    }

    #[test]
    fn wait_time_falls_back_to_spacing_once_reset_passed() {
        let now = Instant::now();
        let reset_at = now - Duration::from_secs(1);
        let last = now - Duration::from_millis(40);

        assert_eq!(
            wait_time(&state(0, Some(reset_at), Some(last)), now, INTERVAL, 10),
            Duration::from_millis(60)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_spaces_consecutive_requests() {
        let limiter = RateLimiter::new(INTERVAL, 10);
        let start = Instant::now();

        drop(limiter.acquire().await);
        drop(limiter.acquire().await);

        assert!(start.elapsed() >= INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_waits_for_reset_when_budget_is_exhausted() {
        let limiter = RateLimiter::new(INTERVAL, 10);

        {
            let mut permit = limiter.acquire().await;
            permit.record(RateLimitInfo {
                limit: 300,
                remaining: 2,
                reset_after: Duration::from_secs(5),
            });
        }
        assert_eq!(limiter.remaining().await, 2);

        let start = Instant::now();
        drop(limiter.acquire().await);

        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_acquire_waits_for_budget_recorded_by_holder() {
        let limiter = RateLimiter::new(INTERVAL, 10);
        let start = Instant::now();

        let holder = async {
            let mut permit = limiter.acquire().await;
            sleep(Duration::from_millis(5)).await;
            permit.record(RateLimitInfo {
                limit: 300,
                remaining: 1,
                reset_after: Duration::from_secs(7),
            });
        };
        let waiter = async {
            // queued behind the holder before it records the budget
            sleep(Duration::from_millis(1)).await;
            drop(limiter.acquire().await);
            start.elapsed()
        };

        let ((), released_after) = tokio::join!(holder, waiter);

        assert!(released_after >= Duration::from_secs(7));
        assert_eq!(limiter.remaining().await, 1);
    }
}
