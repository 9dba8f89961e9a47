//! Retry classification shared by the upstream clients.

/// Errors that can tell a retry loop whether another attempt is worthwhile.
///
/// # Examples
///
/// ```
/// use wayfinder_error::{DestinyError, DestinyErrorKind, RetryableError};
///
/// let throttled = DestinyError::new(DestinyErrorKind::Throttled { attempts: 1 });
/// assert!(throttled.is_retryable());
///
/// let fatal = DestinyError::new(DestinyErrorKind::ServerError {
///     status: 500,
///     body: "oops".into(),
/// });
/// assert!(!fatal.is_retryable());
/// ```
pub trait RetryableError {
    /// Returns true if the failure is transient and the request may be repeated.
    fn is_retryable(&self) -> bool;

    /// Records how many attempts were spent before the error was surfaced.
    ///
    /// The default ignores the count.
    fn with_attempts(self, _attempts: usize) -> Self
    where
        Self: Sized,
    {
        self
    }
}

/// Marker for an operation aborted by its caller's cancellation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("operation cancelled")]
pub struct Cancelled;
