//! Token bucket shared by every sidecar request.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use linodemcp_application::Clock;

use super::config::RateLimitSettings;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    refill_per_second: f64,
    capacity: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Starts full. Capacity is at least one token.
    pub fn new(settings: RateLimitSettings, clock: Arc<dyn Clock>) -> Self {
        let capacity = f64::from(settings.burst.max(1));
        let bucket = Bucket {
            tokens: capacity,
            last_refill: clock.now(),
        };
        Self {
            clock,
            refill_per_second: settings.refill_per_second.max(0.0),
            capacity,
            bucket: Mutex::new(bucket),
        }
    }

    /// Take one token if available.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);

        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_second).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity as u32
    }
}
