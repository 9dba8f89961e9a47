//! Wayfinder CLI binary.
//!
//! - Refresh the clan roster, metrics and mirrored feeds
//! - Administer tracked feeds
//! - Print roster, title and leaderboard reports

use clap::Parser;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use wayfinder::{ObservabilityConfig, WayfinderConfig, init_observability};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{
        AppContext, Cli, Commands, RefreshOptions, handle_feed_command, run_refresh, show_clan,
        show_leaderboard, show_roster, show_titles,
    };

    // Secrets may come from a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = WayfinderConfig::load()?;
    init_observability(&ObservabilityConfig::from_settings(config.logging()).verbose(cli.verbose))?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding requests");
            on_interrupt.cancel();
        }
    });

    let ctx = AppContext::new(config, cancel);
    match cli.command {
        Commands::Refresh {
            timeout_secs,
            destiny_only,
            feeds_only,
        } => {
            run_refresh(
                &ctx,
                RefreshOptions {
                    timeout: timeout_secs.map(Duration::from_secs),
                    destiny: !feeds_only,
                    feeds: !destiny_only,
                },
            )
            .await?;
        }

        Commands::Migrate => {
            let pool = ctx.pool().await?;
            let applied = ctx.migrate(&pool).await?;
            println!("Applied {applied} migration(s)");
        }

        Commands::Feeds(command) => {
            handle_feed_command(&ctx, command).await?;
        }

        Commands::Roster { stale_days, format } => {
            show_roster(&ctx, stale_days, format).await?;
        }

        Commands::Clan { name } => {
            show_clan(&ctx, &name).await?;
        }

        Commands::Titles { format } => {
            show_titles(&ctx, format).await?;
        }

        Commands::Leaderboard { metric, format } => {
            show_leaderboard(&ctx, metric, format).await?;
        }
    }

    Ok(())
}
