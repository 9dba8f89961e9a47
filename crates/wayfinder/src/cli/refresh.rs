//! `wayfinder refresh`.

use super::AppContext;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use wayfinder::{DestinyRefresh, Refresher, RosterFetcher};

/// Branch selection for one refresh.
#[derive(Debug, Clone, Copy)]
pub struct RefreshOptions {
    pub timeout: Option<Duration>,
    pub destiny: bool,
    pub feeds: bool,
}

/// Run one refresh and fail if any branch or feed failed.
pub async fn run_refresh(ctx: &AppContext, options: RefreshOptions) -> Result<(), Box<dyn Error>> {
    let pool = ctx.database().await?;
    let mut refresher = Refresher::new();

    if options.destiny {
        let settings = ctx.config().destiny();
        let fetcher = RosterFetcher::new(ctx.destiny_client().await?, *settings.metrics_concurrency());
        refresher = refresher.with_destiny(DestinyRefresh::new(
            Arc::new(fetcher),
            ctx.roster_repository(&pool),
            *settings.group_id(),
        ));
    }
    if options.feeds {
        refresher = refresher.with_feeds(ctx.feed_sync(ctx.feed_repository(&pool))?);
    }

    let deadline = options.timeout.map(|timeout| {
        let cancel = ctx.cancellation().clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            warn!(?timeout, "Refresh deadline reached, cancelling");
            cancel.cancel();
        })
    });

    let report = refresher.run().await;
    if let Some(deadline) = deadline {
        deadline.abort();
    }

    let report = report.into_result()?;
    if let Some(Ok(destiny)) = &report.destiny {
        info!(
            inserted = destiny.players().inserted(),
            updated = destiny.players().updated(),
            completed = destiny.metrics().completed(),
            "Roster synced"
        );
    }
    if let Some(Ok(feeds)) = &report.feeds {
        info!(published = feeds.published(), "Feeds mirrored");
    }
    Ok(())
}
