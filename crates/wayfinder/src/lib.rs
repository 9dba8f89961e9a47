//! Wayfinder keeps a Destiny clan's roster and metrics in PostgreSQL and
//! mirrors Bluesky accounts into a Discord channel.
//!
//! A refresh runs two independent branches concurrently:
//!
//! - **Destiny**: fetch the clan roster, reconcile players, fetch each
//!   current member's metrics, reconcile metrics
//! - **Feeds**: for every tracked feed, publish posts newer than its
//!   watermark, oldest first, and advance the watermark
//!
//! # Architecture
//!
//! - `wayfinder_error` - error kinds with source locations
//! - `wayfinder_core` - domain types and configuration
//! - `wayfinder_interface` - seams between components
//! - `wayfinder_cache` - cache-aside store (Redis or in-process)
//! - `wayfinder_rate_limit` - throttle retry and request pacing
//! - `wayfinder_destiny` - Destiny API client and roster fetcher
//! - `wayfinder_database` - schema, migrations and bulk reconcile
//! - `wayfinder_social` - Bluesky client, Discord publisher, feed sync
//!
//! This crate wires them together and owns the `wayfinder` binary.
//!
//! # Cargo Features
//!
//! - `discord` (default) - publish mirrored posts to Discord
//! - `observability` - export spans through OpenTelemetry

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod leaderboard;
mod observability;
mod refresh;

pub use leaderboard::{Leaderboard, LeaderboardEntry, metric_leaderboard, rank_metric};
pub use observability::{ObservabilityConfig, init_observability};
pub use refresh::{DestinyRefresh, DestinyRefreshReport, RefreshReport, Refresher};

pub use wayfinder_cache::{Cache, cache_from_env};
pub use wayfinder_core::*;
pub use wayfinder_database::{
    DbPool, InMemoryFeedRepository, InMemoryRosterRepository, PostgresFeedRepository,
    PostgresRosterRepository, pool_from_env, run_migrations,
};
pub use wayfinder_destiny::{ClanTitles, DestinyClient, RosterFetcher};
pub use wayfinder_error::*;
pub use wayfinder_interface::*;
pub use wayfinder_social::{BlueskyClient, FeedAdmin, FeedSync, FeedSyncReport, filter_posts};
#[cfg(feature = "discord")]
pub use wayfinder_social::DiscordPublisher;
