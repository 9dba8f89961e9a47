//! Transport-level HTTP failures.

/// A request that never produced a usable response (connect, TLS, body read).
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("HTTP transport error: {} at line {} in {}", message, line, file)]
pub struct HttpError {
    /// The underlying error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl HttpError {
    /// Create a new HttpError at the caller's location.
    ///
    /// # Examples
    ///
    /// ```
    /// use wayfinder_error::HttpError;
    ///
    /// let err = HttpError::new("connection reset by peer");
    /// assert!(err.to_string().contains("connection reset"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
