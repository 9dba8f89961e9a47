//! Layered configuration.
//!
//! Loads configuration from TOML with a precedence system:
//! - Bundled defaults (include_str! from wayfinder.toml)
//! - User overrides (~/.config/wayfinder/wayfinder.toml, then ./wayfinder.toml)
//! - Environment variables prefixed `WAYFINDER__` (e.g. `WAYFINDER__DESTINY__GROUP_ID`)
//!
//! Secrets never live here. API keys, tokens and connection strings are read
//! from the process environment by the components that need them.

use config::{Config, Environment, File, FileFormat};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use wayfinder_error::{ConfigError, WayfinderResult};

const DEFAULT_CONFIG: &str = include_str!("../../../wayfinder.toml");

/// Destiny API client and fetcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct DestinySettings {
    /// Platform API root
    #[serde(default = "default_api_root")]
    api_root: String,
    /// Static asset root used for manifest definition tables
    #[serde(default = "default_asset_root")]
    asset_root: String,
    /// Clan whose roster is synchronized
    #[serde(default = "default_group_id")]
    group_id: i64,
    /// Wait between retries of a throttled request
    #[serde(default = "default_throttle_retry_secs")]
    throttle_retry_secs: u64,
    /// Retries allowed after the first throttled response
    #[serde(default = "default_max_attempts")]
    max_attempts: usize,
    /// Optional proactive request pacing
    #[serde(default)]
    requests_per_second: Option<u32>,
    /// Concurrent per-player profile fetches
    #[serde(default = "default_metrics_concurrency")]
    metrics_concurrency: usize,
    /// TTL for manifest and definition tables
    #[serde(default = "default_long_ttl_secs")]
    manifest_ttl_secs: u64,
    /// TTL for clan details and member lists
    #[serde(default = "default_long_ttl_secs")]
    clan_ttl_secs: u64,
    /// TTL for per-player profiles
    #[serde(default = "default_profile_ttl_secs")]
    profile_ttl_secs: u64,
    /// Metric shown by the leaderboard command
    #[serde(default = "default_leaderboard_metric")]
    leaderboard_metric: i64,
}

fn default_api_root() -> String {
    "https://www.bungie.net/Platform".to_string()
}

fn default_asset_root() -> String {
    "https://www.bungie.net".to_string()
}

fn default_group_id() -> i64 {
    3760031
}

fn default_throttle_retry_secs() -> u64 {
    120
}

fn default_max_attempts() -> usize {
    10
}

fn default_metrics_concurrency() -> usize {
    1
}

fn default_long_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_profile_ttl_secs() -> u64 {
    2 * 60 * 60
}

fn default_leaderboard_metric() -> i64 {
    24768693
}

impl Default for DestinySettings {
    fn default() -> Self {
        Self {
            api_root: default_api_root(),
            asset_root: default_asset_root(),
            group_id: default_group_id(),
            throttle_retry_secs: default_throttle_retry_secs(),
            max_attempts: default_max_attempts(),
            requests_per_second: None,
            metrics_concurrency: default_metrics_concurrency(),
            manifest_ttl_secs: default_long_ttl_secs(),
            clan_ttl_secs: default_long_ttl_secs(),
            profile_ttl_secs: default_profile_ttl_secs(),
            leaderboard_metric: default_leaderboard_metric(),
        }
    }
}

impl DestinySettings {
    /// Throttle retry interval as a duration.
    pub fn throttle_interval(&self) -> Duration {
        Duration::from_secs(self.throttle_retry_secs)
    }

    /// Manifest cache TTL as a duration.
    pub fn manifest_ttl(&self) -> Duration {
        Duration::from_secs(self.manifest_ttl_secs)
    }

    /// Clan cache TTL as a duration.
    pub fn clan_ttl(&self) -> Duration {
        Duration::from_secs(self.clan_ttl_secs)
    }

    /// Profile cache TTL as a duration.
    pub fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_secs)
    }
}

/// Feed mirroring settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct FeedSettings {
    /// Provider name stored on new feeds
    #[serde(default = "default_feed_source")]
    source: String,
    /// Provider API root
    #[serde(default = "default_feed_api_root")]
    api_root: String,
    /// Posts younger than this are left for the next run
    #[serde(default = "default_grace_period_secs")]
    grace_period_secs: u64,
    /// Channel receiving republished posts
    #[serde(default)]
    channel_id: Option<u64>,
}

fn default_feed_source() -> String {
    "bluesky".to_string()
}

fn default_feed_api_root() -> String {
    "https://public.api.bsky.app".to_string()
}

fn default_grace_period_secs() -> u64 {
    60
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            source: default_feed_source(),
            api_root: default_feed_api_root(),
            grace_period_secs: default_grace_period_secs(),
            channel_id: None,
        }
    }
}

impl FeedSettings {
    /// Grace window as a duration.
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}

/// Cache backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct CacheSettings {
    /// Namespace prepended to every key
    #[serde(default = "default_cache_prefix")]
    prefix: String,
    /// Port used when `REDIS_HOST` carries none
    #[serde(default = "default_redis_port")]
    redis_port: u16,
}

fn default_cache_prefix() -> String {
    "wayfinder:".to_string()
}

fn default_redis_port() -> u16 {
    4646
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            prefix: default_cache_prefix(),
            redis_port: default_redis_port(),
        }
    }
}

/// Database settings. The connection string comes from `DATABASE_URL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct DatabaseSettings {
    /// Maximum pooled connections
    #[serde(default = "default_pool_size")]
    pool_size: u32,
}

fn default_pool_size() -> u32 {
    4
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    level: String,
    /// Emit JSON lines instead of human readable output
    #[serde(default)]
    json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Top-level Wayfinder configuration.
///
/// # Example
///
/// ```no_run
/// use wayfinder_core::WayfinderConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = WayfinderConfig::load()?;
/// println!("Syncing clan {}", config.destiny().group_id());
/// # Ok(())
/// # }
/// ```
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters, derive_setters::Setters,
)]
#[setters(prefix = "with_")]
pub struct WayfinderConfig {
    /// Destiny API settings
    #[serde(default)]
    destiny: DestinySettings,
    /// Feed mirroring settings
    #[serde(default)]
    feeds: FeedSettings,
    /// Cache settings
    #[serde(default)]
    cache: CacheSettings,
    /// Database settings
    #[serde(default)]
    database: DatabaseSettings,
    /// Log output settings
    #[serde(default)]
    logging: LoggingSettings,
}

impl WayfinderConfig {
    /// Parse configuration from a TOML string layered over the bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or a value has the wrong type.
    pub fn from_toml_str(toml: &str) -> WayfinderResult<Self> {
        let builder = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from_str(toml, FileFormat::Toml));
        Self::finish(builder)
    }

    /// Load configuration with precedence: environment > user files > bundled defaults.
    ///
    /// User config files are optional and silently skipped if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if any present source is malformed.
    #[instrument]
    pub fn load() -> WayfinderResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("wayfinder/wayfinder.toml");
            builder = builder.add_source(File::from(user_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("wayfinder").required(false))
            .add_source(
                Environment::with_prefix("WAYFINDER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::finish(builder)
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> WayfinderResult<Self> {
        let config = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        Ok(config)
    }
}
