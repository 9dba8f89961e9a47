//! Feed tracking, fetching and republishing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wayfinder_core::{Feed, FeedPost, NewFeed};
use wayfinder_error::WayfinderResult;

/// Storage for tracked feeds and their watermarks.
#[async_trait]
pub trait FeedRepository: Send + Sync {
    /// Every tracked feed, ordered by source then author.
    async fn list_feeds(&self) -> WayfinderResult<Vec<Feed>>;

    /// Start tracking a feed.
    async fn add_feed(&self, feed: NewFeed) -> WayfinderResult<Feed>;

    /// Record the provider's stable author id for a feed and return the stored row.
    ///
    /// Touches no other column, so a concurrent watermark advance is kept.
    async fn set_author_id(&self, feed_id: i64, author_id: &str) -> WayfinderResult<Feed>;

    /// Move a feed's watermark forward to `watermark`.
    ///
    /// Never moves it backwards: an older value leaves the stored one in place.
    async fn advance_watermark(&self, feed_id: i64, watermark: DateTime<Utc>)
    -> WayfinderResult<()>;

    /// Stop tracking a feed. Returns false if no such feed existed.
    async fn delete_feed(&self, feed_id: i64) -> WayfinderResult<bool>;
}

/// An external content provider.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Provider name recorded on feeds, e.g. `bluesky`.
    fn source_name(&self) -> &str;

    /// Resolve a handle to the provider's stable author id.
    async fn resolve_author(&self, handle: &str) -> WayfinderResult<String>;

    /// Recent posts by an author, newest first.
    async fn recent_posts(&self, author_id: &str) -> WayfinderResult<Vec<FeedPost>>;
}

/// A chat platform that can post a text message to a channel.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Post `content` to `channel_id`.
    async fn publish(&self, channel_id: u64, content: &str) -> WayfinderResult<()>;
}
