//! Feed mirroring for Wayfinder.
//!
//! - [`BlueskyClient`] reads author feeds from the public Bluesky API
//! - `DiscordPublisher` posts messages to a Discord channel (requires the `discord` feature)
//! - [`FeedSync`] ties them together with a per-feed watermark so each post
//!   is mirrored once, oldest first
//! - [`FeedAdmin`] resolves handles when feeds are added or revalidated

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod admin;
mod bluesky;
#[cfg(feature = "discord")]
mod discord;
mod sync;

pub use admin::FeedAdmin;
pub use bluesky::BlueskyClient;
#[cfg(feature = "discord")]
pub use discord::DiscordPublisher;
pub use sync::{FeedSync, FeedSyncReport, filter_posts};
