//! Proactive request pacing using governor.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::trace;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Optional requests-per-second limiter shared by every request of a client.
///
/// An unconfigured pacer never waits. Clones share the same quota.
#[derive(Clone, Default)]
pub struct RequestPacer {
    limiter: Option<Arc<DirectRateLimiter>>,
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl RequestPacer {
    /// Create a pacer allowing `requests_per_second`, or an inert one for `None` or zero.
    pub fn new(requests_per_second: Option<u32>) -> Self {
        let limiter = requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));
        Self { limiter }
    }

    /// True when requests are actually paced.
    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    /// Wait until the next request may be sent.
    pub async fn ready(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
            trace!("Request pacer released");
        }
    }

    /// Take a slot without waiting. Returns false if the quota is exhausted.
    pub fn try_acquire(&self) -> bool {
        match &self.limiter {
            Some(limiter) => limiter.check().is_ok(),
            None => true,
        }
    }
}
