use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window_size: Duration,
    pub max_attempts: u32,
}

impl RateLimitConfig {
    pub fn per_minute(max_attempts: u32) -> Self {
        Self {
            window_size: Duration::minutes(1),
            max_attempts,
        }
    }
}

/// Attempt timestamps for one key, oldest first.
#[derive(Debug, Default)]
struct AttemptLog(VecDeque<DateTime<Utc>>);

impl AttemptLog {
    fn expire(&mut self, now: DateTime<Utc>, window_size: Duration) {
        let cutoff = now - window_size;
        while self.0.front().is_some_and(|ts| *ts <= cutoff) {
            self.0.pop_front();
        }
    }
}

/// Sliding-window limiter keyed by an arbitrary string (the signin username).
pub struct RateLimiter {
    attempts: Arc<RwLock<HashMap<String, AttemptLog>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Records an attempt for `key` and reports whether it is within the limit.
    /// Rejected attempts are not recorded.
    pub async fn record_attempt(&self, key: &str) -> bool {
        let now = Utc::now();
        let mut attempts = self.attempts.write().await;
        let log = attempts.entry(key.to_owned()).or_default();

        log.expire(now, self.config.window_size);
        if log.0.len() >= self.config.max_attempts as usize {
            return false;
        }
        log.0.push_back(now);
        true
    }

    /// Forgets `key`, e.g. after a successful signin.
    pub async fn reset(&self, key: &str) {
        self.attempts.write().await.remove(key);
    }

    /// Drops keys with no attempt inside the current window.
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let window_size = self.config.window_size;
        self.attempts.write().await.retain(|_, log| {
            log.expire(now, window_size);
            !log.0.is_empty()
        });
    }

    pub async fn tracked_keys(&self) -> usize {
        self.attempts.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_attempts_are_limited_per_key() {
        let limiter = RateLimiter::new(RateLimitConfig {
            window_size: Duration::seconds(1),
            max_attempts: 5,
        });

        for _ in 0..5 {
            assert!(limiter.record_attempt("alice").await);
        }
        assert!(!limiter.record_attempt("alice").await);
        assert!(limiter.record_attempt("bob").await);

        sleep(std::time::Duration::from_millis(1100)).await;
        assert!(limiter.record_attempt("alice").await);
    }

    #[tokio::test]
    async fn test_zero_budget_rejects_everything() {
        let limiter = RateLimiter::new(RateLimitConfig::per_minute(0));
        assert!(!limiter.record_attempt("alice").await);
    }

    #[tokio::test]
    async fn test_reset_and_cleanup() {
        let limiter = RateLimiter::new(RateLimitConfig {
            window_size: Duration::milliseconds(200),
            max_attempts: 1,
        });

        assert!(limiter.record_attempt("alice").await);
        assert!(!limiter.record_attempt("alice").await);
        limiter.reset("alice").await;
        assert!(limiter.record_attempt("alice").await);

        assert!(limiter.record_attempt("bob").await);
        assert_eq!(limiter.tracked_keys().await, 2);

        sleep(std::time::Duration::from_millis(300)).await;
        limiter.cleanup().await;
        assert_eq!(limiter.tracked_keys().await, 0);
    }
}
