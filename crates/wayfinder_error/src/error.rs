//! Top-level error wrapper types.

use crate::{CacheError, ConfigError, DestinyError, FeedError, HttpError, RefreshError};
#[cfg(feature = "database")]
use crate::DatabaseError;

/// Every component error the workspace can surface.
///
/// # Examples
///
/// ```
/// use wayfinder_error::{HttpError, WayfinderError};
///
/// let err: WayfinderError = HttpError::new("timed out").into();
/// assert!(format!("{}", err).contains("timed out"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum WayfinderErrorKind {
    /// HTTP transport error
    #[from(HttpError)]
    Http(HttpError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Cache backend error
    #[from(CacheError)]
    Cache(CacheError),
    /// Destiny API error
    #[from(DestinyError)]
    Destiny(DestinyError),
    /// Database error
    #[cfg(feature = "database")]
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Feed provider or publisher error
    #[from(FeedError)]
    Feed(FeedError),
    /// One or more refresh branches failed
    #[from(RefreshError)]
    Refresh(RefreshError),
}

/// Wayfinder error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Wayfinder Error: {}", _0)]
pub struct WayfinderError(Box<WayfinderErrorKind>);

impl WayfinderError {
    /// Create a new error from a kind.
    pub fn new(kind: WayfinderErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &WayfinderErrorKind {
        &self.0
    }

    /// True when this wraps a Destiny request or feed sync aborted by cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self.kind() {
            WayfinderErrorKind::Destiny(e) => e.is_cancelled(),
            WayfinderErrorKind::Feed(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

// Generic From implementation for any type that converts to WayfinderErrorKind
impl<T> From<T> for WayfinderError
where
    T: Into<WayfinderErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Wayfinder operations.
pub type WayfinderResult<T> = std::result::Result<T, WayfinderError>;
