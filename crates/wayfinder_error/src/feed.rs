//! Errors from the feed provider and the message publisher.

use crate::Cancelled;

/// Feed sync failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum FeedErrorKind {
    /// Transport failure talking to the feed provider
    #[display("Feed provider request failed: {}", _0)]
    Http(String),
    /// Feed provider answered with a non-success status
    #[display("Feed provider returned HTTP {}: {}", status, body)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
    /// Feed provider payload could not be decoded
    #[display("Feed payload error: {}", _0)]
    Parse(String),
    /// Feed has not been validated, so its author id is unknown
    #[display("Feed for '{}' has no resolved author id", _0)]
    Unresolved(String),
    /// Publishing a message to the chat channel failed
    #[display("Publish to channel {} failed: {}", channel, message)]
    Publish {
        /// Destination channel id
        channel: u64,
        /// Error reported by the chat platform
        message: String,
    },
    /// Chat platform client could not be created
    #[display("Publisher setup failed: {}", _0)]
    Publisher(String),
    /// Sync was aborted by its cancellation token
    #[display("Feed sync cancelled")]
    Cancelled,
}

/// Feed error with source location tracking.
///
/// # Examples
///
/// ```
/// use wayfinder_error::{FeedError, FeedErrorKind};
///
/// let err = FeedError::new(FeedErrorKind::Unresolved("destinythegame.bungie.net".into()));
/// assert!(err.to_string().contains("no resolved author id"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Feed Error: {} at line {} in {}", kind, line, file)]
pub struct FeedError {
    /// The kind of error that occurred
    pub kind: FeedErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl FeedError {
    /// Create a new FeedError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: FeedErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// True when the sync was aborted by cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.kind == FeedErrorKind::Cancelled
    }
}

impl From<Cancelled> for FeedError {
    #[track_caller]
    fn from(_: Cancelled) -> Self {
        FeedError::new(FeedErrorKind::Cancelled)
    }
}
