//! Feed administration.

use std::sync::Arc;
use tracing::{info, instrument};
use wayfinder_core::{Feed, NewFeed};
use wayfinder_error::WayfinderResult;
use wayfinder_interface::{FeedRepository, FeedSource};

/// Adds and validates tracked feeds against their provider.
#[derive(Clone)]
pub struct FeedAdmin {
    repo: Arc<dyn FeedRepository>,
    source: Arc<dyn FeedSource>,
}

impl std::fmt::Debug for FeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedAdmin")
            .field("source", &self.source.source_name())
            .finish_non_exhaustive()
    }
}

impl FeedAdmin {
    /// Wire administration from its collaborators.
    pub fn new(repo: Arc<dyn FeedRepository>, source: Arc<dyn FeedSource>) -> Self {
        Self { repo, source }
    }

    /// Resolve `handle` with the provider and start tracking it.
    ///
    /// The watermark starts empty, so the first pass mirrors every post the
    /// provider still lists.
    #[instrument(skip(self))]
    pub async fn add_feed(&self, handle: &str) -> WayfinderResult<Feed> {
        let author_id = self.source.resolve_author(handle).await?;
        let feed = self
            .repo
            .add_feed(NewFeed {
                source: self.source.source_name().to_string(),
                author: handle.to_string(),
                author_source_id: Some(author_id),
                last_message: None,
            })
            .await?;
        info!(id = feed.id, "Tracking feed");
        Ok(feed)
    }

    /// Re-resolve an existing feed's author id and store it.
    ///
    /// Only the author id is written; the stored watermark is left as is.
    #[instrument(skip(self, feed), fields(author = %feed.author))]
    pub async fn validate_feed(&self, feed: &Feed) -> WayfinderResult<Feed> {
        let author_id = self.source.resolve_author(&feed.author).await?;
        self.repo.set_author_id(feed.id, &author_id).await
    }
}
