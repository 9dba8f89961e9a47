//! PostgreSQL implementation of RosterRepository.

use crate::connection::{DbPool, with_connection};
use crate::models::{PlayerMetricRow, PlayerRow};
use crate::reconcile;
use crate::schema::{player, player_metric};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::instrument;
use wayfinder_core::{NewPlayer, NewPlayerMetric, Player, PlayerMetric, ReconcileSummary};
use wayfinder_error::WayfinderResult;
use wayfinder_interface::RosterRepository;

/// Roster storage backed by a pooled PostgreSQL connection.
///
/// Diesel is synchronous, so every call checks a connection out of the pool
/// on tokio's blocking thread pool.
#[derive(Debug, Clone)]
pub struct PostgresRosterRepository {
    pool: DbPool,
}

impl PostgresRosterRepository {
    /// Create a repository over an existing pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterRepository for PostgresRosterRepository {
    #[instrument(skip(self, snapshot), fields(rows = snapshot.len()))]
    async fn reconcile_players(
        &self,
        snapshot: Vec<NewPlayer>,
        pass_started: DateTime<Utc>,
    ) -> WayfinderResult<ReconcileSummary> {
        Ok(with_connection(&self.pool, move |conn| {
            reconcile::reconcile_players(conn, snapshot, pass_started)
        })
        .await?)
    }

    #[instrument(skip(self, snapshot), fields(rows = snapshot.len()))]
    async fn reconcile_metrics(
        &self,
        snapshot: Vec<NewPlayerMetric>,
        pass_started: DateTime<Utc>,
    ) -> WayfinderResult<ReconcileSummary> {
        Ok(with_connection(&self.pool, move |conn| {
            reconcile::reconcile_metrics(conn, snapshot, pass_started)
        })
        .await?)
    }

    async fn list_players(&self) -> WayfinderResult<Vec<Player>> {
        let rows = with_connection(&self.pool, |conn| {
            Ok(player::table
                .select(PlayerRow::as_select())
                .order(player::display_name.asc())
                .load(conn)?)
        })
        .await?;
        Ok(rows.into_iter().map(Player::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_stale_players(&self, since: DateTime<Utc>) -> WayfinderResult<Vec<Player>> {
        let rows = with_connection(&self.pool, move |conn| {
            Ok(player::table
                .filter(player::updated_at.lt(since))
                .select(PlayerRow::as_select())
                .order(player::updated_at.asc())
                .load(conn)?)
        })
        .await?;
        Ok(rows.into_iter().map(Player::from).collect())
    }

    async fn player_metrics(&self, player_id: i64) -> WayfinderResult<Vec<PlayerMetric>> {
        let rows = with_connection(&self.pool, move |conn| {
            Ok(player_metric::table
                .filter(player_metric::player_id.eq(player_id))
                .select(PlayerMetricRow::as_select())
                .order(player_metric::metric_id.asc())
                .load(conn)?)
        })
        .await?;
        Ok(rows.into_iter().map(PlayerMetric::from).collect())
    }

    async fn player_metric(
        &self,
        player_id: i64,
        metric_id: i64,
    ) -> WayfinderResult<Option<PlayerMetric>> {
        let row = with_connection(&self.pool, move |conn| {
            Ok(player_metric::table
                .filter(player_metric::player_id.eq(player_id))
                .filter(player_metric::metric_id.eq(metric_id))
                .select(PlayerMetricRow::as_select())
                .first(conn)
                .optional()?)
        })
        .await?;
        Ok(row.map(PlayerMetric::from))
    }

    async fn metric_rows(&self, metric_id: i64) -> WayfinderResult<Vec<PlayerMetric>> {
        let rows = with_connection(&self.pool, move |conn| {
            Ok(player_metric::table
                .filter(player_metric::metric_id.eq(metric_id))
                .select(PlayerMetricRow::as_select())
                .order(player_metric::player_id.asc())
                .load(conn)?)
        })
        .await?;
        Ok(rows.into_iter().map(PlayerMetric::from).collect())
    }
}
