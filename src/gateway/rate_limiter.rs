//! @ai:module:intent Token-bucket rate limiting for provider requests
//! @ai:module:layer infrastructure
//! @ai:module:public_api RateLimiter
//! @ai:module:stateless false

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// @ai:intent Token bucket shared by every request sent through one gateway
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    per_minute: u32,
}

struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

impl Bucket {
    /// @ai:effects state:write
    fn refill(&mut self, per_minute: u32) {
        let now = Instant::now();
        let earned = now.duration_since(self.refilled_at).as_secs_f64() * per_second(per_minute);
        self.tokens = (self.tokens + earned).min(per_minute as f64);
        self.refilled_at = now;
    }
}

fn per_second(per_minute: u32) -> f64 {
    per_minute as f64 / 60.0
}

impl RateLimiter {
    /// @ai:intent Create a limiter that starts with a full minute of tokens
    /// @ai:pre per_minute > 0 (zero is treated as one)
    /// @ai:effects pure
    pub fn per_minute(per_minute: u32) -> Self {
        let per_minute = per_minute.max(1);
        Self {
            bucket: Mutex::new(Bucket {
                tokens: per_minute as f64,
                refilled_at: Instant::now(),
            }),
            per_minute,
        }
    }

    pub fn limit(&self) -> u32 {
        self.per_minute
    }

    /// @ai:intent Take a token without waiting; false when the bucket is empty
    /// @ai:effects state:write
    pub async fn try_acquire(&self) -> bool {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(self.per_minute);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// @ai:intent Wait until a request is allowed, then take a token
    /// @ai:effects state:write, time
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                bucket.refill(self.per_minute);

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return;
                }

                Duration::from_secs_f64((1.0 - bucket.tokens) / per_second(self.per_minute))
            };

            tracing::debug!("Rate limit reached, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }
}
