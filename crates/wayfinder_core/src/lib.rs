//! Core data types for the Wayfinder clan sync pipeline.
//!
//! This crate holds the shapes every other crate agrees on: roster rows,
//! metric rows, tracked feeds and their posts, and the layered configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod feed;
mod player;
mod reconcile;

pub use config::{
    CacheSettings, DatabaseSettings, DestinySettings, FeedSettings, LoggingSettings,
    WayfinderConfig,
};
pub use feed::{Feed, FeedPost, NewFeed};
pub use player::{
    NewPlayer, NewPlayerBuilder, NewPlayerMetric, NewPlayerMetricBuilder, Player, PlayerMetric,
};
pub use reconcile::ReconcileSummary;
