//! Roster and metric snapshots built from Destiny API payloads.

use crate::{ComponentType, DestinyClient, GroupMember, Profile};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt, stream};
use tracing::{info, instrument, warn};
use wayfinder_core::{NewPlayer, NewPlayerMetric, Player};
use wayfinder_error::{DestinyError, DestinyErrorKind, WayfinderResult};
use wayfinder_interface::ClanSource;

/// Convert a member record into a roster row.
///
/// `lastOnlineStatusChange` arrives as epoch seconds in a string and
/// `joinDate` as RFC 3339.
///
/// # Errors
///
/// Returns `Parse` if either timestamp is malformed.
pub fn player_from_member(member: &GroupMember, group_id: i64) -> Result<NewPlayer, DestinyError> {
    let info = &member.destiny_user_info;

    let last_online = member
        .last_online_status_change
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| {
            DestinyError::new(DestinyErrorKind::Parse(format!(
                "could not parse last online timestamp {:?} for {:?}",
                member.last_online_status_change, info.membership_id
            )))
        })?;

    let group_join_date = DateTime::parse_from_rfc3339(&member.join_date)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|e| {
            DestinyError::new(DestinyErrorKind::Parse(format!(
                "could not parse join date {:?} for {:?}: {e}",
                member.join_date, info.membership_id
            )))
        })?;

    Ok(NewPlayer {
        display_name: info.display_name.clone(),
        membership_type: info.membership_type,
        membership_id: info.membership_id.clone(),
        global_display_name: info.bungie_global_display_name.clone(),
        global_display_code: info.bungie_global_display_name_code.unwrap_or_default(),
        group_id: group_id.to_string(),
        group_join_date,
        last_online,
    })
}

/// Convert a profile's metrics component into metric rows for `player`.
///
/// Returns `Ok(None)` when the profile carries no metrics, which happens
/// when the player hides them.
///
/// # Errors
///
/// Returns `Parse` if a metric hash is not numeric.
pub fn metrics_from_profile(
    player: &Player,
    profile: &Profile,
) -> Result<Option<Vec<NewPlayerMetric>>, DestinyError> {
    let Some(metrics) = profile.metrics() else {
        return Ok(None);
    };

    metrics
        .iter()
        .map(|(key, metric)| {
            let metric_id = key.parse::<i64>().map_err(|e| {
                DestinyError::new(DestinyErrorKind::Parse(format!("metric hash {key:?}: {e}")))
            })?;
            let objective = &metric.objective_progress;
            Ok(NewPlayerMetric {
                player_id: player.id,
                metric_id,
                objective_hash: objective.objective_hash,
                progress: objective.progress,
                completion_value: objective.completion_value,
                complete: objective.complete,
                visible: objective.visible,
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// [`ClanSource`] backed by the Destiny API.
///
/// Profile fetches for different players run up to `concurrency` at a time.
/// All of them share one client, so throttling and pacing still apply
/// across the whole fan-out.
#[derive(Debug, Clone)]
pub struct RosterFetcher {
    client: DestinyClient,
    concurrency: usize,
}

impl RosterFetcher {
    /// Create a fetcher. A concurrency of zero is treated as one.
    pub fn new(client: DestinyClient, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Underlying API client.
    pub fn client(&self) -> &DestinyClient {
        &self.client
    }

    /// Fetch and convert the roster of `group_id`. Fails closed: one bad
    /// member record fails the whole roster.
    ///
    /// # Errors
    ///
    /// Returns the request error or the first parse error.
    #[instrument(skip(self))]
    pub async fn fetch_roster(&self, group_id: i64) -> Result<Vec<NewPlayer>, DestinyError> {
        let members = self.client.get_clan_members(group_id).await?;
        let players = members
            .iter()
            .map(|member| player_from_member(member, group_id))
            .collect::<Result<Vec<_>, _>>()?;
        info!(count = players.len(), "Fetched clan roster");
        Ok(players)
    }

    /// Fetch metric rows for every player.
    ///
    /// # Errors
    ///
    /// Fails fast on the first profile that cannot be fetched or converted.
    #[instrument(skip_all, fields(players = players.len(), concurrency = self.concurrency))]
    pub async fn fetch_metrics(&self, players: &[Player]) -> Result<Vec<NewPlayerMetric>, DestinyError> {
        let futures: Vec<_> = players
            .iter()
            .map(|player| self.player_metrics_for(player))
            .collect();
        let batches: Vec<Vec<NewPlayerMetric>> = stream::iter(futures)
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        let metrics: Vec<NewPlayerMetric> = batches.into_iter().flatten().collect();
        info!(count = metrics.len(), "Fetched player metrics");
        Ok(metrics)
    }

    async fn player_metrics_for(&self, player: &Player) -> Result<Vec<NewPlayerMetric>, DestinyError> {
        info!(
            id = player.id,
            membership_type = player.membership_type,
            membership_id = %player.membership_id,
            "Refreshing player metrics"
        );
        let profile = self
            .client
            .get_profile(
                player.membership_type,
                &player.membership_id,
                &[ComponentType::Metrics],
            )
            .await?;

        match metrics_from_profile(player, &profile)? {
            Some(metrics) => Ok(metrics),
            None => {
                warn!(membership_id = %player.membership_id, "Player has no metrics");
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl ClanSource for RosterFetcher {
    async fn roster(&self, group_id: i64) -> WayfinderResult<Vec<NewPlayer>> {
        Ok(self.fetch_roster(group_id).await?)
    }

    async fn player_metrics(&self, players: &[Player]) -> WayfinderResult<Vec<NewPlayerMetric>> {
        Ok(self.fetch_metrics(players).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GroupUserInfoCard;
    use chrono::TimeZone;

    fn member(last_online: &str, join_date: &str) -> GroupMember {
        GroupMember {
            member_type: 3,
            last_online_status_change: last_online.to_string(),
            join_date: join_date.to_string(),
            destiny_user_info: GroupUserInfoCard {
                display_name: "taiidani".to_string(),
                membership_type: 3,
                membership_id: "4611686018467493133".to_string(),
                bungie_global_display_name: "taiidani".to_string(),
                bungie_global_display_name_code: Some(2569),
            },
        }
    }

    fn stored_player() -> Player {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Player {
            id: 7,
            display_name: "taiidani".to_string(),
            membership_type: 3,
            membership_id: "4611686018467493133".to_string(),
            global_display_name: "taiidani".to_string(),
            global_display_code: 2569,
            group_id: "3760031".to_string(),
            group_join_date: at,
            last_online: at,
            updated_at: at,
            created_at: at,
        }
    }

    #[test]
    fn test_player_from_member() {
        let player = player_from_member(&member("1714521600", "2023-01-22T23:28:29Z"), 3760031).unwrap();
        assert_eq!(player.group_id, "3760031");
        assert_eq!(player.global_display_code, 2569);
        assert_eq!(player.last_online, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        assert_eq!(
            player.group_join_date,
            Utc.with_ymd_and_hms(2023, 1, 22, 23, 28, 29).unwrap()
        );
    }

    #[test]
    fn test_player_from_member_bad_last_online() {
        let err = player_from_member(&member("yesterday", "2023-01-22T23:28:29Z"), 1).unwrap_err();
        assert!(matches!(err.kind, DestinyErrorKind::Parse(_)));
        assert!(err.to_string().contains("yesterday"));
    }

    #[test]
    fn test_player_from_member_bad_join_date() {
        let err = player_from_member(&member("1714521600", "22/01/2023"), 1).unwrap_err();
        assert!(matches!(err.kind, DestinyErrorKind::Parse(_)));
    }

    #[test]
    fn test_metrics_from_profile() {
        let profile: Profile = serde_json::from_str(
            r#"{"metrics": {"data": {"metrics": {
                "24768693": {"invisible": false, "objectiveProgress": {
                    "objectiveHash": 1365777019, "progress": 42,
                    "completionValue": 0, "complete": false, "visible": true
                }}
            }}}}"#,
        )
        .unwrap();

        let rows = metrics_from_profile(&stored_player(), &profile).unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key(), (7, 24768693));
        assert_eq!(rows[0].objective_hash, 1365777019);
        assert_eq!(rows[0].progress, Some(42));
        assert!(rows[0].visible);
    }

    #[test]
    fn test_metrics_from_profile_absent() {
        let profile: Profile = serde_json::from_str(r#"{"metrics": {"data": {}}}"#).unwrap();
        assert!(metrics_from_profile(&stored_player(), &profile).unwrap().is_none());
    }

    #[test]
    fn test_metrics_from_profile_bad_hash() {
        let profile: Profile = serde_json::from_str(
            r#"{"metrics": {"data": {"metrics": {
                "fish": {"objectiveProgress": {"objectiveHash": 1}}
            }}}}"#,
        )
        .unwrap();
        assert!(metrics_from_profile(&stored_player(), &profile).is_err());
    }
}
