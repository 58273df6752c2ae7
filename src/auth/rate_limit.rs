use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::domain::types::ApiKeyId;

/// Continuously-refilling token bucket. `capacity` tokens refill over
/// `window`, so the instantaneous rate is `capacity / window` tokens
/// per second rather than a hard reset at a fixed boundary.
struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, window: Duration) -> Self {
        let capacity = capacity as f64;
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec: capacity / window.as_secs_f64(),
            last_refill: Instant::now(),
        }
    }

    fn try_consume(&mut self) -> (bool, u32, u32) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;

        let reset_secs = ((self.capacity - self.tokens) / self.refill_per_sec).ceil() as u32;
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            (true, self.tokens.floor() as u32, reset_secs)
        } else {
            (false, 0, reset_secs)
        }
    }
}

/// Per-API-key rate limiter held once in shared app state, never
/// recreated per request. Each key's bucket is read-and-decremented
/// under its own entry lock, so concurrent requests on different keys
/// never contend with each other.
pub struct RateLimiter {
    buckets: DashMap<ApiKeyId, TokenBucket>,
    limit: u32,
    window: Duration,
}

pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after_secs: u32,
}

impl RateLimiter {
    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            limit: limit_per_minute,
            window: Duration::from_secs(60),
        }
    }

    pub fn check(&self, api_key_id: ApiKeyId) -> RateLimitDecision {
        let mut bucket = self
            .buckets
            .entry(api_key_id)
            .or_insert_with(|| TokenBucket::new(self.limit, self.window));

        let (allowed, remaining, reset_after_secs) = bucket.try_consume();
        RateLimitDecision {
            allowed,
            limit: self.limit,
            remaining,
            reset_after_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_requests_up_to_the_limit() {
        let limiter = RateLimiter::new(3);
        let key = ApiKeyId::new();

        assert!(limiter.check(key).allowed);
        assert!(limiter.check(key).allowed);
        assert!(limiter.check(key).allowed);
        assert!(!limiter.check(key).allowed);
    }

    #[test]
    fn separate_keys_have_independent_buckets() {
        let limiter = RateLimiter::new(1);
        let key_a = ApiKeyId::new();
        let key_b = ApiKeyId::new();

        assert!(limiter.check(key_a).allowed);
        assert!(!limiter.check(key_a).allowed);
        assert!(limiter.check(key_b).allowed);
    }
}
