//! Upstream clan data.

use async_trait::async_trait;
use wayfinder_core::{NewPlayer, NewPlayerMetric, Player};
use wayfinder_error::WayfinderResult;

/// Source of roster and metric snapshots.
#[async_trait]
pub trait ClanSource: Send + Sync {
    /// Fetch the full member list of a clan.
    ///
    /// Fails as a whole if any member record cannot be parsed; a partial
    /// roster is never returned.
    async fn roster(&self, group_id: i64) -> WayfinderResult<Vec<NewPlayer>>;

    /// Fetch the metric snapshot for every given player.
    ///
    /// Players whose metrics component is absent upstream are skipped. Any
    /// other per-player failure fails the whole call.
    async fn player_metrics(&self, players: &[Player]) -> WayfinderResult<Vec<NewPlayerMetric>>;
}
