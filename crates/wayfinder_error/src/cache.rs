//! Cache backend errors.
//!
//! A cache miss is never represented here. Lookups return `Ok(None)` for a
//! missing key, so these kinds only describe genuine backend or codec failures.

/// Cache failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum CacheErrorKind {
    /// Could not reach the backing store
    #[display("Cache connection failed: {}", _0)]
    Connection(String),
    /// The store rejected or failed a command
    #[display("Cache backend error: {}", _0)]
    Backend(String),
    /// A value could not be encoded or decoded
    #[display("Cache serialization error for key '{}': {}", key, message)]
    Serialization {
        /// Namespaced key being read or written
        key: String,
        /// Codec error message
        message: String,
    },
}

/// Cache error with source location tracking.
///
/// # Examples
///
/// ```
/// use wayfinder_error::{CacheError, CacheErrorKind};
///
/// let err = CacheError::new(CacheErrorKind::Backend("READONLY".into()));
/// assert!(err.to_string().contains("READONLY"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Cache Error: {} at line {} in {}", kind, line, file)]
pub struct CacheError {
    /// The kind of error that occurred
    pub kind: CacheErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CacheError {
    /// Create a new CacheError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CacheErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
