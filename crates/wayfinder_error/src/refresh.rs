//! Aggregate failure of a refresh run.

/// One or both refresh branches failed.
///
/// Each entry names the branch and carries its rendered error so both
/// failures survive the join.
///
/// # Examples
///
/// ```
/// use wayfinder_error::RefreshError;
///
/// let err = RefreshError::new(vec![
///     ("destiny".to_string(), "throttled".to_string()),
///     ("feeds".to_string(), "publish failed".to_string()),
/// ]);
/// assert_eq!(err.failures.len(), 2);
/// assert!(err.to_string().contains("feeds: publish failed"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Refresh failed: {} at line {} in {}", summary(failures), line, file)]
pub struct RefreshError {
    /// `(branch, error)` pairs
    pub failures: Vec<(String, String)>,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl RefreshError {
    /// Create a new RefreshError at the caller's location.
    #[track_caller]
    pub fn new(failures: Vec<(String, String)>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            failures,
            line: location.line(),
            file: location.file(),
        }
    }
}

fn summary(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(branch, error)| format!("{branch}: {error}"))
        .collect::<Vec<_>>()
        .join("; ")
}
