//! Error types for the Wayfinder sync pipeline.
//!
//! Every component error follows the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum names the specific failure
//! - `*Error` struct wraps the kind with the source location that raised it
//! - Constructors use `#[track_caller]` so the location is captured automatically
//!
//! Component errors roll up into [`WayfinderError`], which is what the
//! interface traits return.
//!
//! # Examples
//!
//! ```
//! use wayfinder_error::{ConfigError, WayfinderResult};
//!
//! fn load() -> WayfinderResult<String> {
//!     Err(ConfigError::new("BUNGIE_API_KEY not set"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
#[cfg(feature = "database")]
mod database;
mod destiny;
mod error;
mod feed;
mod http;
mod refresh;
mod retry;

pub use cache::{CacheError, CacheErrorKind};
pub use config::ConfigError;
#[cfg(feature = "database")]
pub use database::{DatabaseError, DatabaseErrorKind};
pub use destiny::{DestinyError, DestinyErrorKind};
pub use error::{WayfinderError, WayfinderErrorKind, WayfinderResult};
pub use feed::{FeedError, FeedErrorKind};
pub use http::HttpError;
pub use refresh::RefreshError;
pub use retry::{Cancelled, RetryableError};
