//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the wayfinder binary.

mod commands;
mod context;
mod feeds;
mod refresh;
mod reports;

pub use commands::{Cli, Commands, FeedCommands, OutputFormat};
pub use context::AppContext;
pub use feeds::handle_feed_command;
pub use refresh::{RefreshOptions, run_refresh};
pub use reports::{show_clan, show_leaderboard, show_roster, show_titles};
