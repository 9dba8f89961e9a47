//! Wire types for the Destiny platform API.
//!
//! Only the fields the pipeline reads are modelled. Everything else in the
//! upstream payloads is ignored on decode, which also keeps cached copies small.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Platform response envelope wrapping every `/Platform` payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope<T> {
    /// The payload, absent when the call failed
    #[serde(default = "none")]
    pub response: Option<T>,
    /// Platform error code; 1 means success
    #[serde(default = "success_code")]
    pub error_code: i64,
    /// Platform error name
    #[serde(default)]
    pub error_status: String,
    /// Human readable status message
    #[serde(default)]
    pub message: String,
    /// Seconds the platform asks callers to back off
    #[serde(default)]
    pub throttle_seconds: i64,
}

fn none<T>() -> Option<T> {
    None
}

fn success_code() -> i64 {
    Envelope::<()>::SUCCESS
}

impl<T> Envelope<T> {
    /// Platform code for a successful call.
    pub const SUCCESS: i64 = 1;

    /// True when the platform reported success.
    pub fn is_success(&self) -> bool {
        self.error_code == Self::SUCCESS
    }
}

/// Profile component selectors accepted by `GetProfile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ComponentType {
    /// Basic profile information
    Profiles = 100,
    /// Character summaries
    Characters = 200,
    /// Triumphs, including title records
    Records = 900,
    /// Metrics such as the clan fish tally
    Metrics = 1100,
}

impl ComponentType {
    /// Numeric code sent on the query string.
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Comma separated list for the `components` query parameter.
    pub fn join(components: &[ComponentType]) -> String {
        components
            .iter()
            .map(|c| c.code().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Index of the current content version and its download locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Content version
    #[serde(default)]
    pub version: String,
    /// Per-locale map of definition table name to asset path
    #[serde(default)]
    pub json_world_component_content_paths: HashMap<String, HashMap<String, String>>,
}

impl Manifest {
    /// Locale used for definition lookups.
    pub const LOCALE: &'static str = "en";
    /// Table holding metric definitions.
    pub const METRIC_TABLE: &'static str = "DestinyMetricDefinition";
    /// Table holding record and title definitions.
    pub const RECORD_TABLE: &'static str = "DestinyRecordDefinition";

    /// Asset path of a definition table in the default locale.
    pub fn component_path(&self, table: &str) -> Option<&str> {
        self.json_world_component_content_paths
            .get(Self::LOCALE)
            .and_then(|tables| tables.get(table))
            .map(String::as_str)
    }
}

/// Name, description and icon of a definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayProperties {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Flavor or help text
    #[serde(default)]
    pub description: String,
    /// Relative icon path
    #[serde(default)]
    pub icon: String,
}

/// A metric definition from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDefinition {
    /// Display data
    #[serde(default)]
    pub display_properties: DisplayProperties,
    /// Objective whose progress the metric reports
    #[serde(default)]
    pub tracking_objective_hash: i64,
    /// Leaderboards should sort ascending
    #[serde(default)]
    pub lower_value_is_better: bool,
}

/// Title data attached to a record definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleInfo {
    /// Whether completing the record grants a title
    #[serde(default)]
    pub has_title: bool,
    /// Record counting how many times the title has been gilded
    #[serde(default)]
    pub gilding_tracking_record_hash: Option<i64>,
}

/// A record (triumph) definition from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDefinition {
    /// Display data
    #[serde(default)]
    pub display_properties: DisplayProperties,
    /// Title data, if any
    #[serde(default)]
    pub title_info: TitleInfo,
}

/// Clan details returned by a group lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clan {
    /// Group id
    #[serde(deserialize_with = "string_or_number")]
    pub group_id: String,
    /// Clan name
    pub name: String,
    /// Creation timestamp as reported upstream
    #[serde(default)]
    pub creation_date: String,
    /// About text
    #[serde(default)]
    pub about: String,
    /// Current member count
    #[serde(default)]
    pub member_count: i32,
    /// Motto
    #[serde(default)]
    pub motto: String,
    /// Clan callsign and other clan-specific info
    #[serde(default)]
    pub clan_info: ClanInfo,
}

/// Clan-specific fields of a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanInfo {
    /// Short tag shown next to member names
    #[serde(default)]
    pub clan_callsign: String,
}

/// Payload of a group lookup by name.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupResponse {
    /// Group details
    pub detail: Clan,
}

/// One member of a clan roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    /// Rank within the clan
    #[serde(default)]
    pub member_type: i32,
    /// Epoch seconds of the last online status change, as a string
    #[serde(default)]
    pub last_online_status_change: String,
    /// RFC 3339 timestamp of joining the clan
    #[serde(default)]
    pub join_date: String,
    /// Platform identity
    pub destiny_user_info: GroupUserInfoCard,
}

/// Platform identity of a clan member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupUserInfoCard {
    /// Platform display name
    #[serde(default)]
    pub display_name: String,
    /// Platform the membership belongs to
    pub membership_type: i32,
    /// Platform membership id
    #[serde(deserialize_with = "string_or_number")]
    pub membership_id: String,
    /// Cross-platform display name
    #[serde(default)]
    pub bungie_global_display_name: String,
    /// Numeric suffix of the cross-platform display name
    #[serde(default)]
    pub bungie_global_display_name_code: Option<i32>,
}

/// Payload of a member list lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct MembersResponse {
    /// Members on this page
    #[serde(default)]
    pub results: Vec<GroupMember>,
}

/// Selected components of a player profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Profile-wide triumphs (component 900)
    #[serde(default)]
    pub profile_records: Option<ComponentData<ProfileRecords>>,
    /// Metrics (component 1100)
    #[serde(default)]
    pub metrics: Option<ComponentData<ProfileMetrics>>,
}

impl Profile {
    /// Metrics keyed by metric hash, or `None` if upstream sent none.
    pub fn metrics(&self) -> Option<&HashMap<String, ProfileMetric>> {
        self.metrics
            .as_ref()
            .and_then(|c| c.data.as_ref())
            .and_then(|d| d.metrics.as_ref())
    }

    /// Profile records keyed by record hash, or `None` if upstream sent none.
    pub fn records(&self) -> Option<&HashMap<String, ProfileRecord>> {
        self.profile_records
            .as_ref()
            .and_then(|c| c.data.as_ref())
            .map(|d| &d.records)
    }
}

/// Wrapper every profile component arrives in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentData<T> {
    /// Component payload, absent when privacy settings hide it
    #[serde(default = "none")]
    pub data: Option<T>,
}

/// Metrics component payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetrics {
    /// Metrics keyed by metric hash
    #[serde(default)]
    pub metrics: Option<HashMap<String, ProfileMetric>>,
}

/// Records component payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecords {
    /// Active triumph score
    #[serde(default)]
    pub active_score: i64,
    /// Records keyed by record hash
    #[serde(default)]
    pub records: HashMap<String, ProfileRecord>,
}

/// One metric of a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMetric {
    /// Hidden from the player's metric list
    #[serde(default)]
    pub invisible: bool,
    /// Progress toward the tracked objective
    pub objective_progress: ProfileObjective,
}

/// Progress on one objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileObjective {
    /// Objective hash
    pub objective_hash: i64,
    /// Current progress; upstream omits it for some objectives
    #[serde(default)]
    pub progress: Option<i32>,
    /// Progress required to complete
    #[serde(default)]
    pub completion_value: i32,
    /// Whether the objective is complete
    #[serde(default)]
    pub complete: bool,
    /// Whether the objective is shown to the player
    #[serde(default)]
    pub visible: bool,
}

/// One triumph record of a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    /// Record state bit flags
    #[serde(default)]
    pub state: i32,
    /// Objectives making up the record
    #[serde(default)]
    pub objectives: Vec<ProfileObjective>,
    /// Times the record has been completed, used for gilding counts
    #[serde(default)]
    pub completed_count: Option<i32>,
}

/// Accept an id sent either as a JSON string or a JSON number.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Signed(n) => n.to_string(),
        Raw::Unsigned(n) => n.to_string(),
    })
}
