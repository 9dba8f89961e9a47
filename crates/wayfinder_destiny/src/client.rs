//! Authenticated, throttle-aware Destiny API client.

use crate::Envelope;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};
use wayfinder_cache::Cache;
use wayfinder_core::DestinySettings;
use wayfinder_error::{DestinyError, DestinyErrorKind};
use wayfinder_rate_limit::{RequestPacer, ThrottlePolicy, retry_throttled};

const API_KEY_HEADER: &str = "X-API-Key";

/// Cache lifetimes for the different upstream lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// Manifest and definition tables
    pub manifest: Duration,
    /// Clan details and member lists
    pub clan: Duration,
    /// Per-player profiles
    pub profile: Duration,
}

impl From<&DestinySettings> for CacheTtls {
    fn from(settings: &DestinySettings) -> Self {
        Self {
            manifest: settings.manifest_ttl(),
            clan: settings.clan_ttl(),
            profile: settings.profile_ttl(),
        }
    }
}

/// Destiny platform client.
///
/// Every request carries the API key. A 503 response is treated as
/// throttling and retried per the [`ThrottlePolicy`]; a 500 response is
/// fatal and surfaced at once with its body. Other statuses are left to the
/// caller. Cancelling the token aborts any request, including one waiting
/// out a throttle interval.
///
/// Cloning is cheap and clones share the connection pool, cache and pacer.
#[derive(Debug, Clone)]
pub struct DestinyClient {
    http: Client,
    api_key: String,
    api_root: String,
    asset_root: String,
    cache: Cache,
    ttls: CacheTtls,
    policy: ThrottlePolicy,
    pacer: RequestPacer,
    cancel: CancellationToken,
}

impl DestinyClient {
    /// Create a client from settings and an explicit API key.
    pub fn new(
        api_key: impl Into<String>,
        cache: Cache,
        settings: &DestinySettings,
        cancel: CancellationToken,
    ) -> Self {
        debug!(api_root = %settings.api_root(), "Creating Destiny client");
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            api_root: settings.api_root().trim_end_matches('/').to_string(),
            asset_root: settings.asset_root().trim_end_matches('/').to_string(),
            cache,
            ttls: CacheTtls::from(settings),
            policy: ThrottlePolicy::new(settings.throttle_interval(), *settings.max_attempts()),
            pacer: RequestPacer::new(*settings.requests_per_second()),
            cancel,
        }
    }

    /// Create a client reading the API key from `BUNGIE_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` if the variable is unset or empty.
    pub fn from_env(
        cache: Cache,
        settings: &DestinySettings,
        cancel: CancellationToken,
    ) -> Result<Self, DestinyError> {
        let api_key = std::env::var("BUNGIE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| DestinyError::new(DestinyErrorKind::MissingApiKey))?;
        Ok(Self::new(api_key, cache, settings, cancel))
    }

    /// Replace the throttle policy.
    pub fn with_policy(mut self, policy: ThrottlePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shared cache handle.
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Cache lifetimes in use.
    pub fn ttls(&self) -> &CacheTtls {
        &self.ttls
    }

    /// Throttle policy in use.
    pub fn policy(&self) -> &ThrottlePolicy {
        &self.policy
    }

    /// Cancellation token aborting this client's requests.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fetch a `/Platform` endpoint and unwrap its response envelope.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, exhausted throttling, server errors,
    /// platform error codes and undecodable payloads.
    #[instrument(skip(self))]
    pub async fn get_platform<T: DeserializeOwned>(&self, path: &str) -> Result<T, DestinyError> {
        self.fetch_platform(&format!("{}{}", self.api_root, path)).await
    }

    /// `/Platform` URL built from raw path segments, each percent-encoded.
    ///
    /// The result ends in a slash, as every platform endpoint does.
    ///
    /// # Errors
    ///
    /// Returns `Parse` if the configured API root is not a base URL.
    pub fn platform_url(&self, segments: &[&str]) -> Result<Url, DestinyError> {
        let mut url = Url::parse(&self.api_root).map_err(|e| {
            DestinyError::new(DestinyErrorKind::Parse(format!("{}: {e}", self.api_root)))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                DestinyError::new(DestinyErrorKind::Parse(format!(
                    "{} cannot be a base URL",
                    self.api_root
                )))
            })?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    /// As [`get_platform`](Self::get_platform), for a URL from
    /// [`platform_url`](Self::platform_url).
    ///
    /// # Errors
    ///
    /// Same as [`get_platform`](Self::get_platform).
    pub async fn get_platform_url<T: DeserializeOwned>(&self, url: &Url) -> Result<T, DestinyError> {
        self.fetch_platform(url.as_str()).await
    }

    async fn fetch_platform<T: DeserializeOwned>(&self, url: &str) -> Result<T, DestinyError> {
        let (status, body) = self.send(url).await?;

        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                error!(%url, error = %e, "Failed to decode Destiny response");
                DestinyError::new(DestinyErrorKind::Parse(format!("{url}: {e}")))
            } else {
                DestinyError::new(DestinyErrorKind::Status {
                    status: status.as_u16(),
                    body: body.clone(),
                })
            }
        })?;

        if !envelope.is_success() {
            error!(
                %url,
                code = envelope.error_code,
                status = %envelope.error_status,
                message = %envelope.message,
                "Destiny API reported an error"
            );
            return Err(DestinyError::new(DestinyErrorKind::Api {
                code: envelope.error_code,
                status: envelope.error_status,
                message: envelope.message,
            }));
        }

        envelope.response.ok_or_else(|| {
            DestinyError::new(DestinyErrorKind::Parse(format!(
                "{url}: envelope has no Response"
            )))
        })
    }

    /// Fetch a static asset (definition tables) as raw JSON.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, exhausted throttling, server errors,
    /// non-success statuses and undecodable payloads.
    #[instrument(skip(self))]
    pub async fn get_asset<T: DeserializeOwned>(&self, path: &str) -> Result<T, DestinyError> {
        let url = format!("{}{}", self.asset_root, path);
        let (status, body) = self.send(&url).await?;
        if !status.is_success() {
            return Err(DestinyError::new(DestinyErrorKind::Status {
                status: status.as_u16(),
                body,
            }));
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(%url, error = %e, "Failed to decode Destiny asset");
            DestinyError::new(DestinyErrorKind::Parse(format!("{url}: {e}")))
        })
    }

    /// Send a GET with retry on throttling. Returns status and body for
    /// every status except 500 and 503.
    async fn send(&self, url: &str) -> Result<(StatusCode, String), DestinyError> {
        retry_throttled(&self.policy, &self.cancel, || async {
            self.pacer.ready().await;
            debug!(%url, "Sending Destiny request");

            let response = self
                .http
                .get(url)
                .header(API_KEY_HEADER, &self.api_key)
                .send()
                .await
                .map_err(|e| {
                    error!(%url, error = ?e, "Failed to send Destiny request");
                    DestinyError::new(DestinyErrorKind::Http(e.to_string()))
                })?;

            let status = response.status();
            match status {
                StatusCode::SERVICE_UNAVAILABLE => {
                    Err(DestinyError::new(DestinyErrorKind::Throttled { attempts: 0 }))
                }
                StatusCode::INTERNAL_SERVER_ERROR => {
                    let body = response.text().await.unwrap_or_default();
                    error!(%url, %body, "Destiny API is having issues with the server");
                    Err(DestinyError::new(DestinyErrorKind::ServerError {
                        status: status.as_u16(),
                        body,
                    }))
                }
                _ => {
                    let body = response.text().await.map_err(|e| {
                        DestinyError::new(DestinyErrorKind::Http(e.to_string()))
                    })?;
                    Ok((status, body))
                }
            }
        })
        .await
    }
}
