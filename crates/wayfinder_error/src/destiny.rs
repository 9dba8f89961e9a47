//! Errors raised by the Destiny API client and the fetchers built on it.

use crate::{Cancelled, RetryableError};

/// Destiny API failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum DestinyErrorKind {
    /// API key not found in environment
    #[display("BUNGIE_API_KEY environment variable not set")]
    MissingApiKey,
    /// Upstream kept answering 503 until the retry budget ran out
    #[display("Destiny API throttled the request ({} attempts)", attempts)]
    Throttled {
        /// Attempts spent before giving up
        attempts: usize,
    },
    /// Upstream reported an internal failure; never retried
    #[display("Destiny API server error {}: {}", status, body)]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Response body captured for diagnostics
        body: String,
    },
    /// Any other non-success status
    #[display("Destiny API returned HTTP {}: {}", status, body)]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
    /// The response envelope carried a platform error code
    #[display("Destiny API error {} ({}): {}", code, status, message)]
    Api {
        /// Platform error code
        code: i64,
        /// Platform error status name
        status: String,
        /// Human readable message
        message: String,
    },
    /// Transport failure before a response arrived
    #[display("Destiny API transport error: {}", _0)]
    Http(String),
    /// Payload or a field inside it could not be parsed
    #[display("Destiny API payload error: {}", _0)]
    Parse(String),
    /// A definition or component was not present
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// The caller cancelled while the request was waiting to retry
    #[display("Destiny API request cancelled")]
    Cancelled,
    /// Cache backend failed while serving a Destiny lookup
    #[display("Destiny cache error: {}", _0)]
    Cache(String),
}

impl DestinyErrorKind {
    /// Only throttling is transient. Server errors are surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DestinyErrorKind::Throttled { .. })
    }
}

/// Destiny error with source location tracking.
///
/// # Examples
///
/// ```
/// use wayfinder_error::{DestinyError, DestinyErrorKind};
///
/// let err = DestinyError::new(DestinyErrorKind::NotFound("metric 24768693".into()));
/// assert!(format!("{}", err).contains("24768693"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Destiny Error: {} at line {} in {}", kind, line, file)]
pub struct DestinyError {
    /// The kind of error that occurred
    pub kind: DestinyErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl DestinyError {
    /// Create a new DestinyError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DestinyErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// True when the request was aborted by the caller.
    pub fn is_cancelled(&self) -> bool {
        self.kind == DestinyErrorKind::Cancelled
    }
}

impl RetryableError for DestinyError {
    fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    fn with_attempts(mut self, attempts: usize) -> Self {
        if let DestinyErrorKind::Throttled { attempts: spent } = &mut self.kind {
            *spent = attempts;
        }
        self
    }
}

impl From<Cancelled> for DestinyError {
    #[track_caller]
    fn from(_: Cancelled) -> Self {
        DestinyError::new(DestinyErrorKind::Cancelled)
    }
}
