//! QPX Request Pacing
//! Copyright (c) 2026 Mamy Ratsimbazafy
//! Licensed and distributed under either of
//!   * MIT license (license terms at the root of the package or at http://opensource.org/licenses/MIT).
//!   * Apache v2 license (license terms at the root of the package or at http://www.apache.org/licenses/LICENSE-2.0).
//! at your option. This file may not be copied, modified, or distributed except according to those terms.

//! qpx-internals/request-pacing
//! Spaces outbound requests evenly across the day so a daily query quota is never exceeded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time;

/// Seconds in one quota window.
pub const SECONDS_PER_DAY: u64 = 86_400;

const NANOS_PER_DAY: u128 = SECONDS_PER_DAY as u128 * 1_000_000_000;

/// Custom error for the rate limiter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("queries per day must be non-negative, got {0}")]
    NegativeQuota(i64),
}

/// Fixed-spacing rate limiter driven by a daily quota.
///
/// Every clone shares the same quota, so changing it through one handle
/// affects all of them. A quota of `0` disables limiting.
///
/// This is not a token bucket: there is no burst allowance and no memory of
/// when the previous request went out. Callers wait [`RateLimiter::compute_delay`]
/// before every request.
///
/// # Examples
///
/// ```
/// use qpx_request_pacing::RateLimiter;
/// use std::time::Duration;
///
/// let limiter = RateLimiter::with_queries_per_day(50);
/// assert_eq!(limiter.compute_delay(), Duration::from_secs(1728));
/// ```
#[derive(Clone, Debug, Default)]
pub struct RateLimiter {
    queries_per_day: Arc<AtomicU64>,
}

impl RateLimiter {
    /// A limiter that never waits.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_queries_per_day(queries_per_day: u64) -> Self {
        Self {
            queries_per_day: Arc::new(AtomicU64::new(queries_per_day)),
        }
    }

    pub fn queries_per_day(&self) -> u64 {
        self.queries_per_day.load(Ordering::SeqCst)
    }

    /// Change the quota for this limiter and all of its clones.
    pub fn set_queries_per_day(&self, queries_per_day: i64) -> Result<(), RateLimitError> {
        let quota =
            u64::try_from(queries_per_day).map_err(|_| RateLimitError::NegativeQuota(queries_per_day))?;
        self.queries_per_day.store(quota, Ordering::SeqCst);
        tracing::info!("Set rate limit to {} requests per day", quota);
        Ok(())
    }

    /// Spacing between two requests: `86400 / quota` seconds, or zero when disabled.
    pub fn compute_delay(&self) -> Duration {
        match self.queries_per_day() {
            0 => Duration::ZERO,
            quota => {
                let nanos = NANOS_PER_DAY / quota as u128;
                Duration::new(
                    (nanos / 1_000_000_000) as u64,
                    (nanos % 1_000_000_000) as u32,
                )
            }
        }
    }

    /// Sleep for the configured spacing without blocking the worker thread.
    pub async fn wait(&self) {
        let delay = self.compute_delay();
        if !delay.is_zero() {
            tracing::debug!("Delaying request by {:?}", delay);
            time::sleep(delay).await;
        }
    }

    /// Sleep for the configured spacing, blocking the calling thread.
    pub fn wait_blocking(&self) {
        let delay = self.compute_delay();
        if !delay.is_zero() {
            tracing::debug!("Delaying request by {:?} (blocking)", delay);
            std::thread::sleep(delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_disabled_by_default() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.queries_per_day(), 0);
        assert_eq!(limiter.compute_delay(), Duration::ZERO);
    }

    #[test]
    fn test_delay_formula() {
        for quota in [1u64, 50, 100, 1440, 86_400] {
            let limiter = RateLimiter::with_queries_per_day(quota);
            assert_eq!(
                limiter.compute_delay(),
                Duration::from_secs(SECONDS_PER_DAY / quota),
                "quota {}",
                quota
            );
        }

        // 86400 / 7 is not a whole number of seconds
        let limiter = RateLimiter::with_queries_per_day(7);
        let expected = SECONDS_PER_DAY as f64 / 7.0;
        assert!((limiter.compute_delay().as_secs_f64() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_negative_quota_rejected() {
        let limiter = RateLimiter::with_queries_per_day(10);
        assert_eq!(
            limiter.set_queries_per_day(-1),
            Err(RateLimitError::NegativeQuota(-1))
        );
        assert_eq!(limiter.queries_per_day(), 10, "quota must be left untouched");
    }

    #[test]
    fn test_quota_shared_between_clones() {
        let limiter = RateLimiter::disabled();
        let clone = limiter.clone();
        clone.set_queries_per_day(50).unwrap();
        assert_eq!(limiter.queries_per_day(), 50);
        assert_eq!(limiter.compute_delay(), Duration::from_secs(1728));

        limiter.set_queries_per_day(0).unwrap();
        assert_eq!(clone.compute_delay(), Duration::ZERO);
    }

    #[test]
    fn test_wait_blocking_sleeps_for_delay() {
        // 86_400_000 queries per day -> 1ms spacing
        let limiter = RateLimiter::with_queries_per_day(86_400_000);
        assert_eq!(limiter.compute_delay(), Duration::from_millis(1));

        let start = Instant::now();
        for _ in 0..5 {
            limiter.wait_blocking();
        }
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_wait_suspends_for_delay() {
        let limiter = RateLimiter::with_queries_per_day(86_400_000);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.wait().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_wait_disabled_returns_immediately() {
        let limiter = RateLimiter::disabled();
        let start = Instant::now();
        limiter.wait().await;
        limiter.wait_blocking();
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
