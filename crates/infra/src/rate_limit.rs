//! Keyed token-bucket rate limiting.

use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    /// Refill for the time elapsed since the last call, then take one token.
    fn try_take(&mut self, capacity: f64, window: Duration, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let refill = elapsed.as_secs_f64() / window.as_secs_f64() * capacity;
        self.tokens = (self.tokens + refill).min(capacity);
        self.last_refill = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Allows `capacity` requests per `window` for each key.
#[derive(Clone)]
pub struct RateLimiter<K> {
    buckets: Arc<DashMap<K, Bucket>>,
    capacity: f64,
    window: Duration,
}

impl<K: Eq + Hash + Clone> RateLimiter<K> {
    pub fn new(capacity: u32, window: Duration) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            capacity: f64::from(capacity),
            window,
        }
    }

    /// `false` when `key` has used up its budget.
    pub fn try_acquire(&self, key: &K) -> bool {
        self.try_acquire_at(key, Instant::now())
    }

    fn try_acquire_at(&self, key: &K, now: Instant) -> bool {
        let mut bucket = self.buckets.entry(key.clone()).or_insert_with(|| Bucket {
            tokens: self.capacity,
            last_refill: now,
        });
        bucket.try_take(self.capacity, self.window, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_per_key() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();
        let a = "10.0.0.1".to_string();
        let b = "10.0.0.2".to_string();

        for _ in 0..3 {
            assert!(limiter.try_acquire_at(&a, now));
        }
        assert!(!limiter.try_acquire_at(&a, now));
        assert!(limiter.try_acquire_at(&b, now));
    }

    #[test]
    fn tokens_come_back_over_the_window() {
        let limiter = RateLimiter::new(30, Duration::from_secs(60));
        let start = Instant::now();
        let ip = "10.0.0.1".to_string();

        for _ in 0..30 {
            assert!(limiter.try_acquire_at(&ip, start));
        }
        assert!(!limiter.try_acquire_at(&ip, start));
        // One token every two seconds.
        assert!(!limiter.try_acquire_at(&ip, start + Duration::from_secs(1)));
        assert!(limiter.try_acquire_at(&ip, start + Duration::from_secs(3)));
    }
}
