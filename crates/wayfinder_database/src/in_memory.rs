//! In-memory repositories for tests and dry runs.
//!
//! Both keep their rows behind a `tokio::sync::RwLock`. Reconcile passes work
//! on a copy of the state and swap it in only when every step succeeded, so a
//! failed pass leaves nothing behind, as with the PostgreSQL transaction.

use crate::reconcile::{ReconcileStep, dedupe_last_wins, transaction_error};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use wayfinder_core::{
    Feed, NewFeed, NewPlayer, NewPlayerMetric, Player, PlayerMetric, ReconcileSummary,
};
use wayfinder_error::{DatabaseError, DatabaseErrorKind, WayfinderResult};
use wayfinder_interface::{FeedRepository, RosterRepository};

#[derive(Debug, Clone, Default)]
struct RosterState {
    players: Vec<Player>,
    metrics: Vec<PlayerMetric>,
    next_player_id: i64,
    next_metric_id: i64,
}

/// Roster storage kept in process.
///
/// [`fail_at`](Self::fail_at) makes the next reconcile pass fail at a chosen
/// step, for exercising rollback behavior.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRosterRepository {
    state: Arc<RwLock<RosterState>>,
    fail_at: Arc<RwLock<Option<ReconcileStep>>>,
}

impl InMemoryRosterRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next reconcile pass at `step`.
    pub async fn fail_at(&self, step: ReconcileStep) {
        *self.fail_at.write().await = Some(step);
    }

    /// Number of stored players.
    pub async fn player_count(&self) -> usize {
        self.state.read().await.players.len()
    }

    /// Number of stored metric rows.
    pub async fn metric_count(&self) -> usize {
        self.state.read().await.metrics.len()
    }

    async fn check(&self, step: ReconcileStep) -> Result<(), DatabaseError> {
        let mut fail_at = self.fail_at.write().await;
        if *fail_at == Some(step) {
            *fail_at = None;
            return Err(transaction_error(step, "injected failure", None));
        }
        Ok(())
    }
}

#[async_trait]
impl RosterRepository for InMemoryRosterRepository {
    async fn reconcile_players(
        &self,
        snapshot: Vec<NewPlayer>,
        pass_started: DateTime<Utc>,
    ) -> WayfinderResult<ReconcileSummary> {
        let snapshot = dedupe_last_wins(snapshot, |p| p.membership_id.clone());
        self.check(ReconcileStep::Stage).await?;
        self.check(ReconcileStep::Merge).await?;

        let mut state = self.state.write().await;
        let mut next = RosterState::clone(&state);
        let (mut inserted, mut updated) = (0, 0);

        for incoming in snapshot {
            match next
                .players
                .iter_mut()
                .find(|p| p.membership_id == incoming.membership_id)
            {
                Some(existing) => {
                    existing.display_name = incoming.display_name;
                    existing.membership_type = incoming.membership_type;
                    existing.global_display_name = incoming.global_display_name;
                    existing.global_display_code = incoming.global_display_code;
                    existing.group_id = incoming.group_id;
                    existing.group_join_date = incoming.group_join_date;
                    existing.last_online = incoming.last_online;
                    existing.updated_at = pass_started;
                    updated += 1;
                }
                None => {
                    next.next_player_id += 1;
                    let id = next.next_player_id;
                    next.players.push(Player {
                        id,
                        display_name: incoming.display_name,
                        membership_type: incoming.membership_type,
                        membership_id: incoming.membership_id,
                        global_display_name: incoming.global_display_name,
                        global_display_code: incoming.global_display_code,
                        group_id: incoming.group_id,
                        group_join_date: incoming.group_join_date,
                        last_online: incoming.last_online,
                        updated_at: pass_started,
                        created_at: pass_started,
                    });
                    inserted += 1;
                }
            }
        }

        *state = next;
        debug!(inserted, updated, "Reconciled players in memory");
        Ok(ReconcileSummary::new(inserted, updated, 0))
    }

    async fn reconcile_metrics(
        &self,
        snapshot: Vec<NewPlayerMetric>,
        pass_started: DateTime<Utc>,
    ) -> WayfinderResult<ReconcileSummary> {
        let snapshot = dedupe_last_wins(snapshot, NewPlayerMetric::key);
        self.check(ReconcileStep::Stage).await?;

        let mut state = self.state.write().await;
        let mut next = RosterState::clone(&state);
        let (mut inserted, mut updated) = (0, 0);

        for incoming in snapshot {
            if !next.players.iter().any(|p| p.id == incoming.player_id) {
                return Err(transaction_error(
                    ReconcileStep::Merge,
                    format!("player {} does not exist", incoming.player_id),
                    None,
                )
                .into());
            }

            match next
                .metrics
                .iter_mut()
                .find(|m| (m.player_id, m.metric_id) == incoming.key())
            {
                Some(existing) => {
                    existing.objective_hash = incoming.objective_hash;
                    existing.progress = incoming.progress;
                    existing.completion_value = incoming.completion_value;
                    existing.complete = incoming.complete;
                    existing.visible = incoming.visible;
                    existing.updated_at = pass_started;
                    updated += 1;
                }
                None => {
                    next.next_metric_id += 1;
                    let id = next.next_metric_id;
                    next.metrics.push(PlayerMetric {
                        id,
                        player_id: incoming.player_id,
                        metric_id: incoming.metric_id,
                        objective_hash: incoming.objective_hash,
                        progress: incoming.progress,
                        completion_value: incoming.completion_value,
                        complete: incoming.complete,
                        completed_at: None,
                        visible: incoming.visible,
                        updated_at: pass_started,
                        created_at: pass_started,
                    });
                    inserted += 1;
                }
            }
        }
        self.check(ReconcileStep::Merge).await?;
        self.check(ReconcileStep::Complete).await?;

        let mut completed = 0;
        for metric in next
            .metrics
            .iter_mut()
            .filter(|m| m.complete && m.completed_at.is_none())
        {
            metric.completed_at = Some(pass_started);
            completed += 1;
        }

        *state = next;
        debug!(inserted, updated, completed, "Reconciled metrics in memory");
        Ok(ReconcileSummary::new(inserted, updated, completed))
    }

    async fn list_players(&self) -> WayfinderResult<Vec<Player>> {
        let mut players = self.state.read().await.players.clone();
        players.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(players)
    }

    async fn list_stale_players(&self, since: DateTime<Utc>) -> WayfinderResult<Vec<Player>> {
        let mut players: Vec<Player> = self
            .state
            .read()
            .await
            .players
            .iter()
            .filter(|p| p.updated_at < since)
            .cloned()
            .collect();
        players.sort_by_key(|p| p.updated_at);
        Ok(players)
    }

    async fn player_metrics(&self, player_id: i64) -> WayfinderResult<Vec<PlayerMetric>> {
        let mut metrics: Vec<PlayerMetric> = self
            .state
            .read()
            .await
            .metrics
            .iter()
            .filter(|m| m.player_id == player_id)
            .cloned()
            .collect();
        metrics.sort_by_key(|m| m.metric_id);
        Ok(metrics)
    }

    async fn player_metric(
        &self,
        player_id: i64,
        metric_id: i64,
    ) -> WayfinderResult<Option<PlayerMetric>> {
        Ok(self
            .state
            .read()
            .await
            .metrics
            .iter()
            .find(|m| m.player_id == player_id && m.metric_id == metric_id)
            .cloned())
    }

    async fn metric_rows(&self, metric_id: i64) -> WayfinderResult<Vec<PlayerMetric>> {
        let mut metrics: Vec<PlayerMetric> = self
            .state
            .read()
            .await
            .metrics
            .iter()
            .filter(|m| m.metric_id == metric_id)
            .cloned()
            .collect();
        metrics.sort_by_key(|m| m.player_id);
        Ok(metrics)
    }
}

/// Feed storage kept in process.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFeedRepository {
    feeds: Arc<RwLock<Vec<Feed>>>,
    next_id: Arc<RwLock<i64>>,
}

impl InMemoryFeedRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up one feed by id.
    pub async fn get(&self, feed_id: i64) -> Option<Feed> {
        self.feeds.read().await.iter().find(|f| f.id == feed_id).cloned()
    }
}

#[async_trait]
impl FeedRepository for InMemoryFeedRepository {
    async fn list_feeds(&self) -> WayfinderResult<Vec<Feed>> {
        let mut feeds = self.feeds.read().await.clone();
        feeds.sort_by(|a, b| (&a.source, &a.author).cmp(&(&b.source, &b.author)));
        Ok(feeds)
    }

    async fn add_feed(&self, feed: NewFeed) -> WayfinderResult<Feed> {
        let mut feeds = self.feeds.write().await;
        if feeds
            .iter()
            .any(|f| f.source == feed.source && f.author == feed.author)
        {
            return Err(DatabaseError::new(DatabaseErrorKind::Query(format!(
                "feed {}/{} already exists",
                feed.source, feed.author
            )))
            .into());
        }

        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        let stored = Feed {
            id: *next_id,
            source: feed.source,
            author: feed.author,
            author_source_id: feed.author_source_id,
            last_message: feed.last_message,
        };
        feeds.push(stored.clone());
        Ok(stored)
    }

    async fn set_author_id(&self, feed_id: i64, author_id: &str) -> WayfinderResult<Feed> {
        let mut feeds = self.feeds.write().await;
        let stored = feeds
            .iter_mut()
            .find(|f| f.id == feed_id)
            .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound))?;
        stored.author_source_id = Some(author_id.to_string());
        Ok(stored.clone())
    }

    async fn advance_watermark(
        &self,
        feed_id: i64,
        watermark: DateTime<Utc>,
    ) -> WayfinderResult<()> {
        let mut feeds = self.feeds.write().await;
        let stored = feeds
            .iter_mut()
            .find(|f| f.id == feed_id)
            .ok_or_else(|| DatabaseError::new(DatabaseErrorKind::NotFound))?;
        if stored.last_message.is_none_or(|current| current < watermark) {
            stored.last_message = Some(watermark);
        }
        Ok(())
    }

    async fn delete_feed(&self, feed_id: i64) -> WayfinderResult<bool> {
        let mut feeds = self.feeds.write().await;
        let before = feeds.len();
        feeds.retain(|f| f.id != feed_id);
        Ok(feeds.len() < before)
    }
}
