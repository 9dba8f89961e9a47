//! Diesel row types and their conversions to domain types.

use crate::schema::{feed, player, player_metric, player_metric_staging, player_staging};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use wayfinder_core::{Feed, NewFeed, NewPlayer, NewPlayerMetric, Player, PlayerMetric};

/// Database row for a roster member.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = player)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PlayerRow {
    pub id: i64,
    pub display_name: String,
    pub membership_type: i32,
    pub membership_id: String,
    pub global_display_name: String,
    pub global_display_code: i32,
    pub group_id: String,
    pub group_join_date: DateTime<Utc>,
    pub last_online: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<PlayerRow> for Player {
    fn from(row: PlayerRow) -> Self {
        Player {
            id: row.id,
            display_name: row.display_name,
            membership_type: row.membership_type,
            membership_id: row.membership_id,
            global_display_name: row.global_display_name,
            global_display_code: row.global_display_code,
            group_id: row.group_id,
            group_join_date: row.group_join_date,
            last_online: row.last_online,
            updated_at: row.updated_at,
            created_at: row.created_at,
        }
    }
}

/// Database row for a player's metric.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = player_metric)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PlayerMetricRow {
    pub id: i64,
    pub player_id: i64,
    pub metric_id: i64,
    pub objective_hash: i64,
    pub progress: Option<i32>,
    pub completion_value: i32,
    pub complete: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub visible: bool,
    pub updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<PlayerMetricRow> for PlayerMetric {
    fn from(row: PlayerMetricRow) -> Self {
        PlayerMetric {
            id: row.id,
            player_id: row.player_id,
            metric_id: row.metric_id,
            objective_hash: row.objective_hash,
            progress: row.progress,
            completion_value: row.completion_value,
            complete: row.complete,
            completed_at: row.completed_at,
            visible: row.visible,
            updated_at: row.updated_at,
            created_at: row.created_at,
        }
    }
}

/// Database row for a tracked feed.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = feed)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FeedRow {
    pub id: i64,
    pub source: String,
    pub author: String,
    pub author_source_id: Option<String>,
    pub last_message: Option<DateTime<Utc>>,
}

impl From<FeedRow> for Feed {
    fn from(row: FeedRow) -> Self {
        Feed {
            id: row.id,
            source: row.source,
            author: row.author,
            author_source_id: row.author_source_id,
            last_message: row.last_message,
        }
    }
}

/// Insertable feed row.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = feed)]
#[diesel(treat_none_as_null = true)]
pub struct FeedValues<'a> {
    pub source: &'a str,
    pub author: &'a str,
    pub author_source_id: Option<&'a str>,
    pub last_message: Option<DateTime<Utc>>,
}

impl<'a> From<&'a NewFeed> for FeedValues<'a> {
    fn from(feed: &'a NewFeed) -> Self {
        Self {
            source: &feed.source,
            author: &feed.author,
            author_source_id: feed.author_source_id.as_deref(),
            last_message: feed.last_message,
        }
    }
}

/// Snapshot row loaded into the player staging table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = player_staging)]
pub struct StagedPlayer<'a> {
    pub display_name: &'a str,
    pub membership_type: i32,
    pub membership_id: &'a str,
    pub global_display_name: &'a str,
    pub global_display_code: i32,
    pub group_id: &'a str,
    pub group_join_date: DateTime<Utc>,
    pub last_online: DateTime<Utc>,
}

impl<'a> From<&'a NewPlayer> for StagedPlayer<'a> {
    fn from(player: &'a NewPlayer) -> Self {
        Self {
            display_name: &player.display_name,
            membership_type: player.membership_type,
            membership_id: &player.membership_id,
            global_display_name: &player.global_display_name,
            global_display_code: player.global_display_code,
            group_id: &player.group_id,
            group_join_date: player.group_join_date,
            last_online: player.last_online,
        }
    }
}

/// Snapshot row loaded into the metric staging table.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = player_metric_staging)]
pub struct StagedMetric {
    pub player_id: i64,
    pub metric_id: i64,
    pub objective_hash: i64,
    pub progress: Option<i32>,
    pub completion_value: i32,
    pub complete: bool,
    pub visible: bool,
}

impl From<&NewPlayerMetric> for StagedMetric {
    fn from(metric: &NewPlayerMetric) -> Self {
        Self {
            player_id: metric.player_id,
            metric_id: metric.metric_id,
            objective_hash: metric.objective_hash,
            progress: metric.progress,
            completion_value: metric.completion_value,
            complete: metric.complete,
            visible: metric.visible,
        }
    }
}
