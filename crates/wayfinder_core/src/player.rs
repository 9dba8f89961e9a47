//! Clan roster and per-player metric rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored roster member.
///
/// `created_at` is the first time a refresh saw this member and never
/// changes. `updated_at` moves forward on every refresh that still sees them,
/// so a stale value means the member has probably left the clan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Internal row id
    pub id: i64,
    /// Platform display name
    pub display_name: String,
    /// Platform the membership belongs to (Steam, Xbox, ...)
    pub membership_type: i32,
    /// Platform membership id, the natural key
    pub membership_id: String,
    /// Cross-platform display name
    pub global_display_name: String,
    /// Numeric suffix of the cross-platform display name
    pub global_display_code: i32,
    /// Clan the member was fetched from
    pub group_id: String,
    /// When the member joined the clan
    pub group_join_date: DateTime<Utc>,
    /// Last online status change reported upstream
    pub last_online: DateTime<Utc>,
    /// Last refresh that saw this member
    pub updated_at: DateTime<Utc>,
    /// First refresh that saw this member
    pub created_at: DateTime<Utc>,
}

/// A roster member as fetched upstream, before reconciliation.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use wayfinder_core::NewPlayerBuilder;
///
/// let player = NewPlayerBuilder::default()
///     .display_name("taiidani")
///     .membership_type(3)
///     .membership_id("4611686018467493133")
///     .global_display_name("taiidani")
///     .global_display_code(2569)
///     .group_id("3760031")
///     .group_join_date(Utc.with_ymd_and_hms(2023, 1, 22, 23, 28, 29).unwrap())
///     .last_online(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
///     .build()
///     .unwrap();
/// assert_eq!(player.membership_id, "4611686018467493133");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct NewPlayer {
    /// Platform display name
    pub display_name: String,
    /// Platform the membership belongs to
    pub membership_type: i32,
    /// Platform membership id, the natural key
    pub membership_id: String,
    /// Cross-platform display name
    pub global_display_name: String,
    /// Numeric suffix of the cross-platform display name
    pub global_display_code: i32,
    /// Clan the member was fetched from
    pub group_id: String,
    /// When the member joined the clan
    pub group_join_date: DateTime<Utc>,
    /// Last online status change reported upstream
    pub last_online: DateTime<Utc>,
}

/// A stored metric row for one player.
///
/// `completed_at` is stamped by the first refresh that observes `complete`
/// and is never cleared afterwards, even if upstream later reports the
/// metric as incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMetric {
    /// Internal row id
    pub id: i64,
    /// Owning player row
    pub player_id: i64,
    /// Metric definition hash
    pub metric_id: i64,
    /// Objective tracked by the metric
    pub objective_hash: i64,
    /// Current progress, when upstream reports one
    pub progress: Option<i32>,
    /// Progress needed to complete the objective
    pub completion_value: i32,
    /// Whether upstream considers the objective complete
    pub complete: bool,
    /// First refresh that saw `complete`
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether the objective is visible to the player
    pub visible: bool,
    /// Last refresh that saw this row
    pub updated_at: DateTime<Utc>,
    /// First refresh that saw this row
    pub created_at: DateTime<Utc>,
}

/// A metric observation for one player, before reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct NewPlayerMetric {
    /// Owning player row
    pub player_id: i64,
    /// Metric definition hash
    pub metric_id: i64,
    /// Objective tracked by the metric
    pub objective_hash: i64,
    /// Current progress, when upstream reports one
    #[builder(default)]
    pub progress: Option<i32>,
    /// Progress needed to complete the objective
    pub completion_value: i32,
    /// Whether upstream considers the objective complete
    #[builder(default)]
    pub complete: bool,
    /// Whether the objective is visible to the player
    #[builder(default = "true")]
    pub visible: bool,
}

impl NewPlayerMetric {
    /// Natural key of the row: `(player_id, metric_id)`.
    pub fn key(&self) -> (i64, i64) {
        (self.player_id, self.metric_id)
    }
}
