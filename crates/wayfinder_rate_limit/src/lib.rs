//! Rate limiting for upstream API calls.
//!
//! Two independent mechanisms live here:
//! - [`retry_throttled`] reacts to throttling responses by waiting a fixed
//!   interval and retrying within a bounded budget, abortable through a
//!   [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - [`RequestPacer`] proactively spaces requests using governor's GCRA limiter

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod pacer;
mod retry;

pub use pacer::RequestPacer;
pub use retry::{ThrottlePolicy, retry_throttled};
