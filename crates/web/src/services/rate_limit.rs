//! Fixed-window request counters.
//!
//! Counters live in process memory and reset when the process restarts.
//! Entries expire one window after their last update.

use std::time::{Duration, Instant};

use moka::future::Cache;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Outcome of a limiter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Allows `limit` hits per key in each fixed window.
#[derive(Clone)]
pub struct FixedWindowLimiter {
    windows: Cache<String, Window>,
    limit: u32,
    window: Duration,
}

impl FixedWindowLimiter {
    #[must_use]
    pub fn new(limit: u32, window: Duration) -> Self {
        let windows = Cache::builder()
            .max_capacity(100_000)
            .time_to_idle(window)
            .build();
        Self {
            windows,
            limit,
            window,
        }
    }

    /// Count a hit for `key`.
    pub async fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now()).await
    }

    /// Count a hit for `key` at `now`.
    ///
    /// A hit after the window's reset time opens a new window. Hits beyond
    /// the limit are refused and do not extend the window.
    pub async fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let limit = self.limit;
        let window = self.window;

        let entry = self
            .windows
            .entry(key.to_owned())
            .and_upsert_with(|existing| {
                let next = match existing.map(moka::Entry::into_value) {
                    Some(w) if now <= w.reset_at => Window {
                        count: w.count.saturating_add(1).min(limit.saturating_add(1)),
                        reset_at: w.reset_at,
                    },
                    _ => Window {
                        count: 1,
                        reset_at: now + window,
                    },
                };
                std::future::ready(next)
            })
            .await;

        let current = entry.into_value();
        if current.count > limit {
            RateDecision::Limited {
                retry_after: current.reset_at.saturating_duration_since(now),
            }
        } else {
            RateDecision::Allowed {
                remaining: limit - current.count,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_limit() {
        let limiter = FixedWindowLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(
            limiter.check_at("k", now).await,
            RateDecision::Allowed { remaining: 2 }
        );
        assert_eq!(
            limiter.check_at("k", now).await,
            RateDecision::Allowed { remaining: 1 }
        );
        assert_eq!(
            limiter.check_at("k", now).await,
            RateDecision::Allowed { remaining: 0 }
        );
        assert!(!limiter.check_at("k", now).await.is_allowed());
        assert!(!limiter.check_at("k", now).await.is_allowed());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(limiter.check_at("a", now).await.is_allowed());
        assert!(!limiter.check_at("a", now).await.is_allowed());
        assert!(limiter.check_at("b", now).await.is_allowed());
    }

    #[tokio::test]
    async fn test_window_resets_after_expiry() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert!(limiter.check_at("k", start).await.is_allowed());
        let decision = limiter.check_at("k", start + Duration::from_secs(10)).await;
        assert_eq!(
            decision,
            RateDecision::Limited {
                retry_after: Duration::from_secs(50)
            }
        );

        let later = start + Duration::from_secs(61);
        assert!(limiter.check_at("k", later).await.is_allowed());
    }
}
