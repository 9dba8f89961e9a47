//! CLI command definitions.

use clap::{Parser, Subcommand, ValueEnum};

/// Wayfinder - Destiny clan sync and Bluesky feed mirroring
#[derive(Parser, Debug)]
#[command(name = "wayfinder")]
#[command(about = "Destiny clan sync and Bluesky feed mirroring", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync the clan roster and metrics, and mirror tracked feeds
    Refresh {
        /// Cancel outstanding work after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Only run the Destiny branch
        #[arg(long, conflicts_with = "feeds_only")]
        destiny_only: bool,

        /// Only run the feed branch
        #[arg(long)]
        feeds_only: bool,
    },

    /// Apply pending database migrations
    Migrate,

    /// Feed administration
    #[command(subcommand)]
    Feeds(FeedCommands),

    /// Show stored roster members
    Roster {
        /// Only members no refresh has seen for this many days
        #[arg(long)]
        stale_days: Option<i64>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Look up a clan by name
    Clan {
        /// Clan name
        name: String,
    },

    /// Report every member's titles and gildings
    Titles {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Rank stored members by a metric
    Leaderboard {
        /// Metric hash (defaults to the configured leaderboard metric)
        #[arg(long)]
        metric: Option<i64>,

        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },
}

/// Feed administration subcommands
#[derive(Subcommand, Debug)]
pub enum FeedCommands {
    /// Track an account, resolving its handle first
    Add {
        /// Account handle, e.g. destinythegame.bungie.net
        handle: String,
    },

    /// List tracked feeds
    List {
        /// Output format
        #[arg(long, default_value = "human")]
        format: OutputFormat,
    },

    /// Re-resolve a feed's author id
    Validate {
        /// Feed id
        id: i64,
    },

    /// Stop tracking a feed
    Remove {
        /// Feed id
        id: i64,
    },
}

/// Output format options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_flags() {
        let cli = Cli::parse_from(["wayfinder", "refresh", "--timeout-secs", "300", "--feeds-only"]);
        match cli.command {
            Commands::Refresh {
                timeout_secs,
                destiny_only,
                feeds_only,
            } => {
                assert_eq!(timeout_secs, Some(300));
                assert!(!destiny_only);
                assert!(feeds_only);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_branch_flags_conflict() {
        let parsed =
            Cli::try_parse_from(["wayfinder", "refresh", "--destiny-only", "--feeds-only"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_feed_subcommands() {
        let cli = Cli::parse_from(["wayfinder", "-v", "feeds", "remove", "7"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Feeds(FeedCommands::Remove { id: 7 })
        ));
    }

    #[test]
    fn test_leaderboard_json() {
        let cli = Cli::parse_from(["wayfinder", "leaderboard", "--metric", "1", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Commands::Leaderboard {
                metric: Some(1),
                format: OutputFormat::Json
            }
        ));
    }
}
