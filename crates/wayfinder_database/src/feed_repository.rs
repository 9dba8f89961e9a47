//! PostgreSQL implementation of FeedRepository.

use crate::connection::{DbPool, with_connection};
use crate::models::{FeedRow, FeedValues};
use crate::schema::feed;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::{debug, info, instrument};
use wayfinder_core::{Feed, NewFeed};
use wayfinder_error::{DatabaseError, DatabaseErrorKind, WayfinderResult};
use wayfinder_interface::FeedRepository;

/// Feed storage backed by a pooled PostgreSQL connection.
#[derive(Debug, Clone)]
pub struct PostgresFeedRepository {
    pool: DbPool,
}

impl PostgresFeedRepository {
    /// Create a repository over an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedRepository for PostgresFeedRepository {
    async fn list_feeds(&self) -> WayfinderResult<Vec<Feed>> {
        let rows = with_connection(&self.pool, |conn| {
            Ok(feed::table
                .select(FeedRow::as_select())
                .order((feed::source.asc(), feed::author.asc()))
                .load(conn)?)
        })
        .await?;
        Ok(rows.into_iter().map(Feed::from).collect())
    }

    #[instrument(skip(self, new_feed), fields(source = %new_feed.source, author = %new_feed.author))]
    async fn add_feed(&self, new_feed: NewFeed) -> WayfinderResult<Feed> {
        let row = with_connection(&self.pool, move |conn| {
            Ok(diesel::insert_into(feed::table)
                .values(FeedValues::from(&new_feed))
                .returning(FeedRow::as_returning())
                .get_result(conn)?)
        })
        .await?;
        info!(id = row.id, "Added feed");
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn set_author_id(&self, feed_id: i64, author_id: &str) -> WayfinderResult<Feed> {
        let author_id = author_id.to_string();
        let row = with_connection(&self.pool, move |conn| {
            diesel::update(feed::table.find(feed_id))
                .set(feed::author_source_id.eq(Some(author_id)))
                .returning(FeedRow::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound))
        })
        .await?;
        info!("Stored author id");
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn advance_watermark(
        &self,
        feed_id: i64,
        watermark: DateTime<Utc>,
    ) -> WayfinderResult<()> {
        with_connection(&self.pool, move |conn| {
            let changed = diesel::update(
                feed::table.find(feed_id).filter(
                    feed::last_message
                        .is_null()
                        .or(feed::last_message.lt(watermark)),
                ),
            )
            .set(feed::last_message.eq(Some(watermark)))
            .execute(conn)?;

            if changed == 0 {
                // Either the stored watermark is already newer or the feed is gone
                let exists: i64 = feed::table.find(feed_id).count().get_result(conn)?;
                if exists == 0 {
                    return Err(DatabaseError::new(DatabaseErrorKind::NotFound));
                }
                debug!("Stored watermark already at or past the new value");
            }
            Ok(())
        })
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_feed(&self, feed_id: i64) -> WayfinderResult<bool> {
        let deleted = with_connection(&self.pool, move |conn| {
            Ok(diesel::delete(feed::table.find(feed_id)).execute(conn)?)
        })
        .await?;
        Ok(deleted > 0)
    }
}
