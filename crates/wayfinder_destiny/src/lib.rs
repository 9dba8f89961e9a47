//! Destiny platform API client for clan data.
//!
//! [`DestinyClient`] handles authentication, throttle retries, request
//! pacing and response caching. On top of it:
//!
//! - manifest lookups resolve metric and record definitions
//! - clan and profile lookups fetch rosters and per-player components
//! - [`RosterFetcher`] turns those payloads into roster and metric rows and
//!   implements [`ClanSource`](wayfinder_interface::ClanSource)
//! - [`DestinyClient::clan_titles`] builds a per-member title report
//!
//! # Example
//!
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use wayfinder_cache::Cache;
//! use wayfinder_core::DestinySettings;
//! use wayfinder_destiny::{DestinyClient, RosterFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = DestinySettings::default();
//! let client = DestinyClient::from_env(Cache::memory("wayfinder:"), &settings, CancellationToken::new())?;
//! let roster = RosterFetcher::new(client, 1).fetch_roster(*settings.group_id()).await?;
//! println!("{} members", roster.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod clan;
mod client;
mod manifest;
mod models;
mod roster;
mod titles;

pub use client::{CacheTtls, DestinyClient};
pub use models::{
    Clan, ClanInfo, ComponentData, ComponentType, DisplayProperties, Envelope, GroupMember,
    GroupResponse, GroupUserInfoCard, Manifest, MembersResponse, MetricDefinition, Profile,
    ProfileMetric, ProfileMetrics, ProfileObjective, ProfileRecord, ProfileRecords,
    RecordDefinition, TitleInfo,
};
pub use roster::{RosterFetcher, metrics_from_profile, player_from_member};
pub use titles::{ClanTitles, MemberTitles, Title, title_definitions, titles_from_profile};
