//! Construction of the long-lived collaborators a command needs.
//!
//! Every handle is built once per process and passed down explicitly.

use std::error::Error;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};
use wayfinder::{
    BlueskyClient, ConfigError, DestinyClient, FeedAdmin, FeedRepository, FeedSource, FeedSync,
    DbPool, PostgresFeedRepository, PostgresRosterRepository, WayfinderConfig, cache_from_env,
    pool_from_env, run_migrations,
};

/// Process-wide settings and cancellation.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: WayfinderConfig,
    cancel: CancellationToken,
}

impl AppContext {
    pub fn new(config: WayfinderConfig, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    pub fn config(&self) -> &WayfinderConfig {
        &self.config
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Connection pool from `DATABASE_URL`.
    #[instrument(skip(self))]
    pub async fn pool(&self) -> Result<DbPool, Box<dyn Error>> {
        let settings = self.config.database().clone();
        Ok(tokio::task::spawn_blocking(move || pool_from_env(&settings)).await??)
    }

    /// Connection pool with pending migrations applied.
    pub async fn database(&self) -> Result<DbPool, Box<dyn Error>> {
        let pool = self.pool().await?;
        self.migrate(&pool).await?;
        Ok(pool)
    }

    /// Apply pending migrations, returning how many ran.
    pub async fn migrate(&self, pool: &DbPool) -> Result<usize, Box<dyn Error>> {
        let pool = pool.clone();
        let applied = tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            run_migrations(&mut conn)
        })
        .await??;
        if applied > 0 {
            info!(applied, "Database schema migrated");
        }
        Ok(applied)
    }

    pub fn roster_repository(&self, pool: &DbPool) -> Arc<PostgresRosterRepository> {
        Arc::new(PostgresRosterRepository::new(pool.clone()))
    }

    pub fn feed_repository(&self, pool: &DbPool) -> Arc<PostgresFeedRepository> {
        Arc::new(PostgresFeedRepository::new(pool.clone()))
    }

    /// Destiny client over the configured cache.
    pub async fn destiny_client(&self) -> Result<DestinyClient, Box<dyn Error>> {
        let cache = cache_from_env(self.config.cache()).await?;
        info!(backend = cache.backend_name(), "Cache ready");
        Ok(DestinyClient::from_env(
            cache,
            self.config.destiny(),
            self.cancel.clone(),
        )?)
    }

    /// Feed provider named by `[feeds] source`.
    pub fn feed_source(&self) -> Result<Arc<dyn FeedSource>, Box<dyn Error>> {
        let feeds = self.config.feeds();
        match feeds.source().as_str() {
            "bluesky" => Ok(Arc::new(BlueskyClient::new(feeds.api_root().clone()))),
            other => Err(ConfigError::new(format!("Unsupported feed source: {other}")).into()),
        }
    }

    /// Destination channel: `BLUESKY_FEED_CHANNEL_ID`, else `[feeds] channel_id`.
    pub fn channel_id(&self) -> Result<u64, Box<dyn Error>> {
        if let Ok(raw) = std::env::var("BLUESKY_FEED_CHANNEL_ID") {
            return raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::new(format!("Invalid BLUESKY_FEED_CHANNEL_ID '{raw}': {e}")).into()
            });
        }
        self.config.feeds().channel_id().ok_or_else(|| {
            ConfigError::new("No feed channel: set BLUESKY_FEED_CHANNEL_ID or feeds.channel_id")
                .into()
        })
    }

    /// Feed administration against the configured provider.
    pub fn feed_admin(&self, repo: Arc<dyn FeedRepository>) -> Result<FeedAdmin, Box<dyn Error>> {
        Ok(FeedAdmin::new(repo, self.feed_source()?))
    }

    /// Feed sync that publishes to the configured Discord channel.
    #[cfg(feature = "discord")]
    pub fn feed_sync(&self, repo: Arc<dyn FeedRepository>) -> Result<FeedSync, Box<dyn Error>> {
        let publisher = wayfinder::DiscordPublisher::from_env()?;
        Ok(FeedSync::new(
            repo,
            self.feed_source()?,
            Arc::new(publisher),
            self.channel_id()?,
            self.config.feeds().grace_period(),
        )
        .with_cancellation(self.cancel.clone()))
    }

    #[cfg(not(feature = "discord"))]
    pub fn feed_sync(&self, _repo: Arc<dyn FeedRepository>) -> Result<FeedSync, Box<dyn Error>> {
        Err(ConfigError::new("Built without the `discord` feature; feeds cannot be published").into())
    }
}
