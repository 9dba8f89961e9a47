//! Throttle retry loop.

use derive_getters::Getters;
use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_retry2::strategy::FixedInterval;
use tokio_retry2::{Retry, RetryError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wayfinder_error::{Cancelled, RetryableError};

/// How long to wait after a throttling response and how many times to retry.
///
/// One policy covers a single logical request: the budget is spent across
/// its whole retry loop and starts fresh for the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct ThrottlePolicy {
    /// Wait between a throttled response and the next attempt
    interval: Duration,
    /// Retries allowed after the first attempt
    max_attempts: usize,
}

impl ThrottlePolicy {
    /// Create a policy.
    pub fn new(interval: Duration, max_attempts: usize) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Longest time the loop can spend waiting before giving up.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts as u32
    }
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(120), 10)
    }
}

/// Run `op`, retrying while it fails with a retryable error.
///
/// Retryable failures wait `policy.interval()` before the next attempt, up
/// to `policy.max_attempts()` retries; after that the last error is returned
/// with the attempt count recorded. Non-retryable failures are returned
/// immediately. Cancelling `cancel` aborts the loop, including a pending
/// wait, and yields `E::from(Cancelled)`.
///
/// # Errors
///
/// Returns the operation's error, or the cancellation error.
pub async fn retry_throttled<T, E, F, Fut>(
    policy: &ThrottlePolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, E>
where
    E: RetryableError + From<Cancelled> + Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if cancel.is_cancelled() {
        return Err(E::from(Cancelled));
    }

    let attempts = AtomicUsize::new(0);
    let strategy = FixedInterval::new(policy.interval).take(policy.max_attempts);
    let retry = Retry::spawn(strategy, || {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let fut = op();
        async move {
            match fut.await {
                Ok(value) => Ok(value),
                Err(e) if e.is_retryable() => {
                    warn!(attempt, error = %e, "Upstream throttled the request, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => Err(RetryError::Permanent(e)),
            }
        }
    });

    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(attempts = attempts.load(Ordering::SeqCst), "Retry loop cancelled");
            Err(E::from(Cancelled))
        }
        result = retry => result.map_err(|e| {
            let spent = attempts.load(Ordering::SeqCst);
            if e.is_retryable() {
                warn!(attempts = spent, error = %e, "Retry budget exhausted");
            }
            e.with_attempts(spent)
        }),
    }
}
