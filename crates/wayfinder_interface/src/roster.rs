//! Durable roster storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wayfinder_core::{NewPlayer, NewPlayerMetric, Player, PlayerMetric, ReconcileSummary};
use wayfinder_error::WayfinderResult;

/// Storage for players and their metrics.
///
/// Both reconcile operations are all-or-nothing. Matched rows get
/// `updated_at = pass_started` and keep `created_at`; new rows get both
/// timestamps set to `pass_started`.
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Reconcile a full roster snapshot keyed by membership id.
    async fn reconcile_players(
        &self,
        snapshot: Vec<NewPlayer>,
        pass_started: DateTime<Utc>,
    ) -> WayfinderResult<ReconcileSummary>;

    /// Reconcile a full metric snapshot keyed by `(player_id, metric_id)`,
    /// then stamp `completed_at` on rows that are complete for the first time.
    async fn reconcile_metrics(
        &self,
        snapshot: Vec<NewPlayerMetric>,
        pass_started: DateTime<Utc>,
    ) -> WayfinderResult<ReconcileSummary>;

    /// Every stored player.
    async fn list_players(&self) -> WayfinderResult<Vec<Player>>;

    /// Players no refresh has seen since `since`.
    async fn list_stale_players(&self, since: DateTime<Utc>) -> WayfinderResult<Vec<Player>>;

    /// Every metric row of one player.
    async fn player_metrics(&self, player_id: i64) -> WayfinderResult<Vec<PlayerMetric>>;

    /// One metric row of one player, if stored.
    async fn player_metric(
        &self,
        player_id: i64,
        metric_id: i64,
    ) -> WayfinderResult<Option<PlayerMetric>>;

    /// Every player's row for one metric.
    async fn metric_rows(&self, metric_id: i64) -> WayfinderResult<Vec<PlayerMetric>>;
}
