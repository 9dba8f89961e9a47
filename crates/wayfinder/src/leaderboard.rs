//! Clan leaderboards over stored metric rows.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;
use wayfinder_core::{Player, PlayerMetric};
use wayfinder_destiny::DestinyClient;
use wayfinder_error::WayfinderResult;
use wayfinder_interface::RosterRepository;

/// One ranked member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct LeaderboardEntry {
    /// 1-based rank; tied progress shares a rank
    rank: usize,
    /// Member display name
    display_name: String,
    /// Reported progress, if visible
    progress: Option<i32>,
    /// Whether the metric's objective is complete
    complete: bool,
}

/// A metric ranked across the stored roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Leaderboard {
    /// Metric hash
    metric_id: i64,
    /// Metric display name
    name: String,
    /// Lower progress ranks higher
    lower_is_better: bool,
    /// Ranked entries
    entries: Vec<LeaderboardEntry>,
}

/// Rank `rows` by progress.
///
/// Rows without progress (hidden by privacy settings) sink to the bottom
/// regardless of direction. Rows whose player is unknown are dropped.
pub fn rank_metric(
    players: &[Player],
    rows: &[PlayerMetric],
    lower_is_better: bool,
) -> Vec<LeaderboardEntry> {
    let names: HashMap<i64, &str> = players
        .iter()
        .map(|p| (p.id, p.display_name.as_str()))
        .collect();

    let mut ranked: Vec<(&str, &PlayerMetric)> = rows
        .iter()
        .filter_map(|row| names.get(&row.player_id).map(|name| (*name, row)))
        .collect();
    ranked.sort_by(|(a_name, a), (b_name, b)| {
        let by_progress = match (a.progress, b.progress) {
            (Some(x), Some(y)) if lower_is_better => x.cmp(&y),
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        by_progress.then_with(|| a_name.cmp(b_name))
    });

    let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(ranked.len());
    for (position, (name, row)) in ranked.into_iter().enumerate() {
        let rank = match entries.last() {
            Some(previous) if previous.progress == row.progress => previous.rank,
            _ => position + 1,
        };
        entries.push(LeaderboardEntry {
            rank,
            display_name: name.to_string(),
            progress: row.progress,
            complete: row.complete,
        });
    }
    entries
}

/// Leaderboard for `metric_id`, labelled from the manifest.
///
/// # Errors
///
/// Returns `NotFound` if the manifest has no such metric, or any storage error.
#[instrument(skip(client, roster))]
pub async fn metric_leaderboard(
    client: &DestinyClient,
    roster: &dyn RosterRepository,
    metric_id: i64,
) -> WayfinderResult<Leaderboard> {
    let definition = client.metric_definition(metric_id).await?;
    let players = roster.list_players().await?;
    let rows = roster.metric_rows(metric_id).await?;

    Ok(Leaderboard {
        metric_id,
        name: definition.display_properties.name,
        lower_is_better: definition.lower_value_is_better,
        entries: rank_metric(&players, &rows, definition.lower_value_is_better),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn player(id: i64, name: &str) -> Player {
        let now = Utc::now();
        Player {
            id,
            display_name: name.to_string(),
            membership_type: 3,
            membership_id: id.to_string(),
            global_display_name: name.to_string(),
            global_display_code: 1,
            group_id: "3760031".to_string(),
            group_join_date: now,
            last_online: now,
            updated_at: now,
            created_at: now,
        }
    }

    fn row(player_id: i64, progress: Option<i32>) -> PlayerMetric {
        let now = Utc::now();
        PlayerMetric {
            id: player_id,
            player_id,
            metric_id: 24768693,
            objective_hash: 1365777019,
            progress,
            completion_value: 0,
            complete: false,
            completed_at: None,
            visible: progress.is_some(),
            updated_at: now,
            created_at: now,
        }
    }

    #[test]
    fn test_ranks_descending_with_ties() {
        let players = vec![player(1, "ana"), player(2, "bo"), player(3, "cy"), player(4, "di")];
        let rows = vec![row(1, Some(10)), row(2, Some(40)), row(3, Some(40)), row(4, None)];

        let entries = rank_metric(&players, &rows, false);
        let ranks: Vec<_> = entries
            .iter()
            .map(|e| (e.display_name.as_str(), e.rank))
            .collect();
        assert_eq!(ranks, [("bo", 1), ("cy", 1), ("ana", 3), ("di", 4)]);
    }

    #[test]
    fn test_lower_is_better_keeps_hidden_last() {
        let players = vec![player(1, "ana"), player(2, "bo"), player(3, "cy")];
        let rows = vec![row(1, None), row(2, Some(40)), row(3, Some(12))];

        let entries = rank_metric(&players, &rows, true);
        let names: Vec<_> = entries.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names, ["cy", "bo", "ana"]);
    }

    #[test]
    fn test_rows_for_unknown_players_dropped() {
        let entries = rank_metric(&[player(1, "ana")], &[row(1, Some(1)), row(9, Some(99))], false);
        assert_eq!(entries.len(), 1);
    }
}
