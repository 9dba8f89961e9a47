//! Trait definitions for the Wayfinder sync pipeline.
//!
//! Each trait is a seam between the refresh orchestrator and one external
//! collaborator: the game API, the relational store, the feed provider and
//! the chat platform. Production implementations live in the component
//! crates; in-memory implementations back the tests.

mod destiny;
mod feeds;
mod roster;

pub use destiny::ClanSource;
pub use feeds::{FeedRepository, FeedSource, MessagePublisher};
pub use roster::RosterRepository;
