//! Rate limiter for the price API.
//!
//! Implements a sliding window rate limiter that tracks requests per client
//! and enforces a request quota within the window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Rate limiter tracking API requests per client key
#[derive(Clone)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    requests: Arc<RwLock<HashMap<String, Vec<Instant>>>>,
}

/// Outcome of a single rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request recorded; `remaining` requests are left in the window
    Allowed { remaining: u32 },
    /// Quota exhausted; the oldest request leaves the window after `retry_after`
    Rejected { retry_after: Duration },
}

impl RateLimiter {
    /// Create a new rate limiter allowing `limit` requests per `window`
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            requests: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check if a request from `client` is allowed and record it if so
    pub async fn check_and_record(&self, client: &str) -> RateLimitDecision {
        let now = Instant::now();

        let mut requests = self.requests.write().await;

        // Drop clients whose whole history fell out of the window
        requests.retain(|_, times| times.last().is_some_and(|&t| now.duration_since(t) < self.window));

        let times = requests.entry(client.to_string()).or_default();
        times.retain(|&t| now.duration_since(t) < self.window);

        if times.len() < self.limit as usize {
            times.push(now);
            RateLimitDecision::Allowed {
                remaining: self.limit.saturating_sub(times.len() as u32),
            }
        } else {
            let retry_after = times
                .first()
                .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)))
                .unwrap_or(self.window);
            RateLimitDecision::Rejected { retry_after }
        }
    }

    /// Get current rate limit statistics for `client`
    pub async fn get_stats(&self, client: &str) -> RateLimitStats {
        let now = Instant::now();

        let requests = self.requests.read().await;
        let in_window: Vec<Instant> = requests
            .get(client)
            .map(|times| {
                times
                    .iter()
                    .copied()
                    .filter(|&t| now.duration_since(t) < self.window)
                    .collect()
            })
            .unwrap_or_default();

        let used = in_window.len() as u32;

        // The window frees a slot once the oldest tracked request expires
        let until_reset = in_window
            .first()
            .map(|&oldest| self.window.saturating_sub(now.duration_since(oldest)))
            .unwrap_or_default();
        let reset = chrono::Utc::now().timestamp() + until_reset.as_secs_f64().ceil() as i64;

        RateLimitStats {
            limit: self.limit,
            remaining: self.limit.saturating_sub(used),
            used,
            reset,
        }
    }
}

/// Rate limit statistics
#[derive(Debug, Clone)]
pub struct RateLimitStats {
    pub limit: u32,
    pub remaining: u32,
    pub used: u32,
    pub reset: i64, // Unix timestamp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_allows_requests_within_limit() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));

        for expected_remaining in (0..5).rev() {
            assert_eq!(
                limiter.check_and_record("10.0.0.1").await,
                RateLimitDecision::Allowed {
                    remaining: expected_remaining
                }
            );
        }

        // 6th request should be denied
        assert!(matches!(
            limiter.check_and_record("10.0.0.1").await,
            RateLimitDecision::Rejected { .. }
        ));
    }

    #[tokio::test]
    async fn test_rate_limiter_tracks_clients_separately() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(matches!(
            limiter.check_and_record("alice").await,
            RateLimitDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check_and_record("alice").await,
            RateLimitDecision::Rejected { .. }
        ));
        assert!(matches!(
            limiter.check_and_record("bob").await,
            RateLimitDecision::Allowed { .. }
        ));
    }

    #[tokio::test]
    async fn test_rate_limiter_resets_after_window() {
        let limiter = RateLimiter::new(2, Duration::from_millis(50));

        assert!(matches!(limiter.check_and_record("c").await, RateLimitDecision::Allowed { .. }));
        assert!(matches!(limiter.check_and_record("c").await, RateLimitDecision::Allowed { .. }));
        match limiter.check_and_record("c").await {
            RateLimitDecision::Rejected { retry_after } => {
                assert!(retry_after <= Duration::from_millis(50));
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        tokio::time::sleep(Duration::from_millis(80)).await;

        assert!(matches!(limiter.check_and_record("c").await, RateLimitDecision::Allowed { .. }));
    }

    #[tokio::test]
    async fn test_rate_limiter_stats() {
        let limiter = RateLimiter::new(10, Duration::from_secs(60));

        for _ in 0..3 {
            limiter.check_and_record("10.0.0.2").await;
        }

        let stats = limiter.get_stats("10.0.0.2").await;
        assert_eq!(stats.limit, 10);
        assert_eq!(stats.used, 3);
        assert_eq!(stats.remaining, 7);
        assert!(stats.reset > 0);

        let fresh = limiter.get_stats("10.0.0.3").await;
        assert_eq!(fresh.used, 0);
        assert_eq!(fresh.remaining, 10);
    }
}
