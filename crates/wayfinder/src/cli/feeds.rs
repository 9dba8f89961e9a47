//! `wayfinder feeds ...`.

use super::{AppContext, FeedCommands, OutputFormat};
use std::error::Error;
use wayfinder::{ConfigError, FeedRepository};

pub async fn handle_feed_command(ctx: &AppContext, command: FeedCommands) -> Result<(), Box<dyn Error>> {
    let pool = ctx.database().await?;
    let repo = ctx.feed_repository(&pool);

    match command {
        FeedCommands::Add { handle } => {
            let feed = ctx.feed_admin(repo)?.add_feed(&handle).await?;
            println!("Tracking {} as feed {} ({})", feed.author, feed.id, feed.profile_url());
        }
        FeedCommands::List { format } => {
            let feeds = repo.list_feeds().await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&feeds)?),
                OutputFormat::Human => {
                    if feeds.is_empty() {
                        println!("No feeds tracked");
                    }
                    for feed in feeds {
                        let last = feed
                            .last_message
                            .map_or_else(|| "never".to_string(), |t| t.to_rfc3339());
                        let status = if feed.resolved_author().is_some() {
                            "validated"
                        } else {
                            "unvalidated"
                        };
                        println!(
                            "{:>4}  {:<8} {:<40} {:<12} last post {}",
                            feed.id, feed.source, feed.author, status, last
                        );
                    }
                }
            }
        }
        FeedCommands::Validate { id } => {
            let feed = repo
                .list_feeds()
                .await?
                .into_iter()
                .find(|f| f.id == id)
                .ok_or_else(|| ConfigError::new(format!("No feed with id {id}")))?;
            let feed = ctx.feed_admin(repo)?.validate_feed(&feed).await?;
            println!(
                "Feed {} resolves to {}",
                feed.id,
                feed.resolved_author().unwrap_or_default()
            );
        }
        FeedCommands::Remove { id } => {
            if repo.delete_feed(id).await? {
                println!("Removed feed {id}");
            } else {
                println!("No feed with id {id}");
            }
        }
    }
    Ok(())
}
