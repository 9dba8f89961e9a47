//! Watermark-based mirroring of feed posts into a chat channel.
//!
//! Each pass fetches an author's recent posts, drops the ones already
//! mirrored or still inside the grace window, and publishes the rest oldest
//! first. The feed's watermark only ever moves forward, and only as far as
//! the newest post that was actually published.

use chrono::{DateTime, TimeDelta, Utc};
use derive_getters::Getters;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use wayfinder_core::{Feed, FeedPost};
use wayfinder_error::{Cancelled, FeedError, FeedErrorKind, WayfinderResult};
use wayfinder_interface::{FeedRepository, FeedSource, MessagePublisher};

/// Posts from `posts` that should be published now, oldest first.
///
/// A post qualifies when it is older than `now - grace` and strictly newer
/// than the feed's watermark. Upstream embeds for very fresh posts may not
/// be ready yet, so those wait for a later pass.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, Utc};
/// use wayfinder_core::{Feed, FeedPost};
/// use wayfinder_social::filter_posts;
///
/// let now = Utc::now();
/// let post = |secs: i64, id: &str| FeedPost {
///     uri: format!("at://did:plc:abc/app.bsky.feed.post/{id}"),
///     author_handle: "destinythegame.bungie.net".into(),
///     text: String::new(),
///     created_at: now - Duration::seconds(secs),
/// };
/// let feed = Feed {
///     id: 1,
///     source: "bluesky".into(),
///     author: "destinythegame.bungie.net".into(),
///     author_source_id: Some("did:plc:abc".into()),
///     last_message: Some(now - Duration::seconds(7200)),
/// };
///
/// let fresh = filter_posts(
///     &feed,
///     vec![post(5, "a"), post(90, "b"), post(3600, "c")],
///     now,
///     std::time::Duration::from_secs(60),
/// );
/// let ids: Vec<_> = fresh.iter().map(|p| p.post_id()).collect();
/// assert_eq!(ids, ["c", "b"]);
/// ```
pub fn filter_posts(
    feed: &Feed,
    posts: Vec<FeedPost>,
    now: DateTime<Utc>,
    grace: Duration,
) -> Vec<FeedPost> {
    let Some(cutoff) = TimeDelta::from_std(grace)
        .ok()
        .and_then(|grace| now.checked_sub_signed(grace))
    else {
        return Vec::new();
    };

    let mut fresh: Vec<FeedPost> = posts
        .into_iter()
        .filter(|post| post.created_at <= cutoff)
        .filter(|post| {
            feed.last_message
                .is_none_or(|watermark| post.created_at > watermark)
        })
        .collect();
    // Providers list newest first, but pinned posts can appear out of order
    fresh.sort_by_key(|post| post.created_at);
    fresh
}

/// Outcome of mirroring every tracked feed once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters)]
pub struct FeedSyncReport {
    /// Feeds processed without error
    synced: usize,
    /// Messages published across all feeds
    published: usize,
    /// `(author, error)` for every feed that failed
    failures: Vec<(String, String)>,
}

impl FeedSyncReport {
    /// True when no feed failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Mirrors tracked feeds into one chat channel.
///
/// Cancelling the token set with [`with_cancellation`](FeedSync::with_cancellation)
/// abandons any provider or publisher call in flight. Every feed not yet
/// finished then fails with `Cancelled`.
#[derive(Clone)]
pub struct FeedSync {
    repo: Arc<dyn FeedRepository>,
    source: Arc<dyn FeedSource>,
    publisher: Arc<dyn MessagePublisher>,
    channel_id: u64,
    grace: Duration,
    cancel: CancellationToken,
}

impl std::fmt::Debug for FeedSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedSync")
            .field("source", &self.source.source_name())
            .field("channel_id", &self.channel_id)
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}

impl FeedSync {
    /// Wire a sync pass from its collaborators.
    pub fn new(
        repo: Arc<dyn FeedRepository>,
        source: Arc<dyn FeedSource>,
        publisher: Arc<dyn MessagePublisher>,
        channel_id: u64,
        grace: Duration,
    ) -> Self {
        Self {
            repo,
            source,
            publisher,
            channel_id,
            grace,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort provider and publisher calls when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Feed storage.
    pub fn repository(&self) -> &Arc<dyn FeedRepository> {
        &self.repo
    }

    /// Mirror every tracked feed of this source.
    ///
    /// Feeds are processed one after another and independently: a failure is
    /// logged and recorded in the report, then the next feed runs.
    #[instrument(skip(self))]
    pub async fn sync_all(&self) -> WayfinderResult<FeedSyncReport> {
        let feeds = self.repo.list_feeds().await?;
        let mut report = FeedSyncReport::default();

        for feed in feeds
            .iter()
            .filter(|f| f.source == self.source.source_name())
        {
            match self.sync_feed(feed, Utc::now()).await {
                Ok(published) => {
                    report.synced += 1;
                    report.published += published;
                }
                Err(e) => {
                    error!(author = %feed.author, error = %e, "Feed sync failed");
                    report.failures.push((feed.author.clone(), e.to_string()));
                }
            }
        }

        info!(
            synced = report.synced,
            published = report.published,
            failed = report.failures.len(),
            "Feed sync complete"
        );
        Ok(report)
    }

    /// Mirror one feed as of `now`, returning how many posts were published.
    ///
    /// If a publish fails, the watermark is advanced to the newest post that
    /// did go out and the error is returned. The failed post and everything
    /// after it are retried on the next pass. When the failed post shares its
    /// timestamp with the last one published, the watermark stays put, since
    /// moving it would hide the failed post for good.
    #[instrument(skip(self, feed), fields(author = %feed.author))]
    pub async fn sync_feed(&self, feed: &Feed, now: DateTime<Utc>) -> WayfinderResult<usize> {
        let author_id = feed
            .resolved_author()
            .ok_or_else(|| FeedError::new(FeedErrorKind::Unresolved(feed.author.clone())))?;

        let posts = self
            .until_cancelled(self.source.recent_posts(author_id))
            .await?;
        let fresh = filter_posts(feed, posts, now, self.grace);
        if fresh.is_empty() {
            info!("No new posts since the last pass");
            return Ok(0);
        }

        let mut watermark: Option<DateTime<Utc>> = None;
        let mut published = 0;
        for post in &fresh {
            let sent = self
                .until_cancelled(self.publisher.publish(self.channel_id, &post.url()))
                .await;
            if let Err(e) = sent {
                warn!(uri = %post.uri, published, "Publish failed, keeping the rest for the next pass");
                if let Some(watermark) = watermark.filter(|w| post.created_at > *w) {
                    self.repo.advance_watermark(feed.id, watermark).await?;
                }
                return Err(e);
            }
            published += 1;
            // fresh is sorted oldest first
            watermark = Some(post.created_at);
        }

        if let Some(watermark) = watermark {
            self.repo.advance_watermark(feed.id, watermark).await?;
        }
        info!(published, "Mirrored new posts");
        Ok(published)
    }

    async fn until_cancelled<T>(
        &self,
        call: impl Future<Output = WayfinderResult<T>>,
    ) -> WayfinderResult<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FeedError::from(Cancelled).into()),
            result = call => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(id: &str, created_at: DateTime<Utc>) -> FeedPost {
        FeedPost {
            uri: format!("at://did:plc:abc/app.bsky.feed.post/{id}"),
            author_handle: "destinythegame.bungie.net".to_string(),
            text: String::new(),
            created_at,
        }
    }

    fn feed(last_message: Option<DateTime<Utc>>) -> Feed {
        Feed {
            id: 1,
            source: "bluesky".to_string(),
            author: "destinythegame.bungie.net".to_string(),
            author_source_id: Some("did:plc:abc".to_string()),
            last_message,
        }
    }

    #[test]
    fn test_watermark_ties_are_excluded() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let watermark = now - TimeDelta::hours(1);
        let fresh = filter_posts(
            &feed(Some(watermark)),
            vec![post("new", now - TimeDelta::minutes(30)), post("tie", watermark)],
            now,
            Duration::from_secs(60),
        );
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].post_id(), "new");
    }

    #[test]
    fn test_no_watermark_takes_everything_outside_grace() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let fresh = filter_posts(
            &feed(None),
            vec![
                post("b", now - TimeDelta::minutes(2)),
                post("a", now - TimeDelta::days(30)),
                post("edge", now - TimeDelta::seconds(60)),
            ],
            now,
            Duration::from_secs(60),
        );
        let ids: Vec<_> = fresh.iter().map(FeedPost::post_id).collect();
        assert_eq!(ids, ["a", "b", "edge"]);
    }

    #[test]
    fn test_oversized_grace_publishes_nothing() {
        let now = Utc::now();
        let fresh = filter_posts(
            &feed(None),
            vec![post("a", now - TimeDelta::days(1))],
            now,
            Duration::from_secs(u64::MAX),
        );
        assert!(fresh.is_empty());
    }
}
