//! Redis cache backend.

use crate::CacheBackend;
use async_trait::async_trait;
use derive_getters::Getters;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use std::time::Duration;
use tracing::{debug, instrument};
use wayfinder_error::{CacheError, CacheErrorKind};

/// Where and how to reach Redis.
///
/// # Examples
///
/// ```
/// use wayfinder_cache::RedisSettingsBuilder;
///
/// let settings = RedisSettingsBuilder::default()
///     .host("cache.internal")
///     .port(6380u16)
///     .password(Some("hunter2".to_string()))
///     .build()
///     .unwrap();
/// assert!(settings.tls());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct RedisSettings {
    /// Server host name
    host: String,
    /// Server port
    port: u16,
    /// ACL user name
    #[builder(default)]
    username: Option<String>,
    /// Password
    #[builder(default)]
    password: Option<String>,
}

impl RedisSettings {
    /// Read `REDIS_HOST`, `REDIS_PORT`, `REDIS_USER` and `REDIS_PASSWORD`.
    ///
    /// Returns `None` when `REDIS_HOST` is unset. The host may carry its own
    /// port as `host:port`; otherwise `REDIS_PORT` is used, then `default_port`.
    pub fn from_env(default_port: u16) -> Option<Self> {
        let host = std::env::var("REDIS_HOST").ok()?;
        Some(Self::from_parts(
            &host,
            std::env::var("REDIS_PORT").ok().as_deref(),
            std::env::var("REDIS_USER").ok(),
            std::env::var("REDIS_PASSWORD").ok(),
            default_port,
        ))
    }

    /// Assemble settings from raw environment values.
    pub fn from_parts(
        host: &str,
        port: Option<&str>,
        username: Option<String>,
        password: Option<String>,
        default_port: u16,
    ) -> Self {
        let (host, port) = match host.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host, port),
        };
        let port = port
            .and_then(|p| p.trim().parse::<u16>().ok())
            .unwrap_or(default_port);

        Self {
            host: host.to_string(),
            port,
            username,
            password,
        }
    }

    /// Credentialed connections are made over TLS.
    pub fn tls(&self) -> bool {
        self.username.is_some() || self.password.is_some()
    }

    fn connection_info(&self) -> ConnectionInfo {
        let addr = if self.tls() {
            ConnectionAddr::TcpTls {
                host: self.host.clone(),
                port: self.port,
                insecure: false,
                tls_params: None,
            }
        } else {
            ConnectionAddr::Tcp(self.host.clone(), self.port)
        };

        ConnectionInfo {
            addr,
            redis: RedisConnectionInfo {
                username: self.username.clone(),
                password: self.password.clone(),
                ..Default::default()
            },
        }
    }
}

/// Durable backend storing entries in Redis.
#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend").finish_non_exhaustive()
    }
}

impl RedisBackend {
    /// Connect and verify the server answers `PING`.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the server is unreachable or rejects
    /// the credentials.
    #[instrument(skip_all, fields(host = %settings.host(), port = settings.port()))]
    pub async fn connect(settings: &RedisSettings) -> Result<Self, CacheError> {
        let client = Client::open(settings.connection_info())
            .map_err(|e| CacheError::new(CacheErrorKind::Connection(e.to_string())))?;
        let mut connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::new(CacheErrorKind::Connection(e.to_string())))?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|e| CacheError::new(CacheErrorKind::Connection(e.to_string())))?;
        debug!(%pong, "Redis connection verified");

        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let result: redis::RedisResult<()> = if ttl.is_zero() {
            conn.set(key, value).await
        } else {
            // EX has one second resolution; round sub-second TTLs up rather than to "no expiry"
            conn.set_ex(key, value, ttl.as_secs().max(1)).await
        };
        result.map_err(|e| CacheError::new(CacheErrorKind::Backend(e.to_string())))
    }

    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.connection.clone();
        conn.get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(|e| CacheError::new(CacheErrorKind::Backend(e.to_string())))
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
