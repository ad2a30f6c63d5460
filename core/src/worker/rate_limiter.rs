//! Token bucket shared by every outbound query

use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Token bucket using the GCRA implementation from the governor crate
///
/// Up to `capacity` queries may start back to back; after that one token
/// comes back per `refill_interval`. Refill is computed from timestamps on
/// each acquisition, so there is no background timer to stop. Teardown is
/// [`TokenBucket::close`], after which waiters and new callers are refused.
///
/// Share a single instance via `Arc` so every worker passes the same gate.
pub struct TokenBucket {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    capacity: u32,
    refill_interval: Duration,
    closed: CancellationToken,
}

impl TokenBucket {
    /// Create a bucket holding `capacity` tokens, refilled one per `refill_interval`
    ///
    /// # Examples
    /// ```
    /// use range_harvest_core::worker::TokenBucket;
    /// use std::time::Duration;
    ///
    /// // Burst of 10, then one query every 100ms
    /// let bucket = TokenBucket::new(10, Duration::from_millis(100)).unwrap();
    /// assert_eq!(bucket.capacity(), 10);
    /// ```
    pub fn new(capacity: u32, refill_interval: Duration) -> Result<Self, RateLimitError> {
        let burst = NonZeroU32::new(capacity).ok_or(RateLimitError::InvalidCapacity)?;
        let quota = Quota::with_period(refill_interval)
            .ok_or(RateLimitError::InvalidInterval(refill_interval))?
            .allow_burst(burst);

        Ok(Self {
            limiter: RateLimiter::direct(quota),
            capacity,
            refill_interval,
            closed: CancellationToken::new(),
        })
    }

    /// Wait for a token and consume it
    ///
    /// Returns [`RateLimitError::Closed`] if the bucket is closed before a
    /// token becomes available. A waiter that is refused consumes nothing.
    pub async fn acquire(&self) -> Result<(), RateLimitError> {
        if self.closed.is_cancelled() {
            return Err(RateLimitError::Closed);
        }

        tokio::select! {
            biased;
            _ = self.closed.cancelled() => Err(RateLimitError::Closed),
            _ = self.limiter.until_ready() => Ok(()),
        }
    }

    /// Consume a token if one is available right now
    pub fn try_acquire(&self) -> bool {
        !self.closed.is_cancelled() && self.limiter.check().is_ok()
    }

    /// Refuse all current and future acquisitions
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Whether [`TokenBucket::close`] was called
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Bucket size
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Time for one token to come back
    pub fn refill_interval(&self) -> Duration {
        self.refill_interval
    }
}

impl std::fmt::Debug for TokenBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucket")
            .field("capacity", &self.capacity)
            .field("refill_interval", &self.refill_interval)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Rate limiter errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateLimitError {
    /// Capacity of zero
    #[error("token bucket capacity must be at least 1")]
    InvalidCapacity,

    /// Zero refill interval
    #[error("invalid refill interval: {0:?}")]
    InvalidInterval(Duration),

    /// The bucket was closed during teardown
    #[error("token bucket closed")]
    Closed,
}
