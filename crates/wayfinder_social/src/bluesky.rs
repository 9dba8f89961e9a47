//! Read-only client for the public Bluesky AppView.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, instrument};
use wayfinder_core::FeedPost;
use wayfinder_error::{FeedError, FeedErrorKind, WayfinderResult};
use wayfinder_interface::FeedSource;

const DEFAULT_API_ROOT: &str = "https://public.api.bsky.app";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct Profile {
    did: String,
}

#[derive(Debug, Deserialize)]
struct AuthorFeed {
    #[serde(default)]
    feed: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    post: PostView,
}

#[derive(Debug, Deserialize)]
struct PostView {
    uri: String,
    author: PostAuthor,
    record: PostRecord,
}

#[derive(Debug, Deserialize)]
struct PostAuthor {
    handle: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostRecord {
    #[serde(default)]
    text: String,
    created_at: DateTime<Utc>,
}

impl From<PostView> for FeedPost {
    fn from(post: PostView) -> Self {
        Self {
            uri: post.uri,
            author_handle: post.author.handle,
            text: post.record.text,
            created_at: post.record.created_at,
        }
    }
}

/// Bluesky feed provider.
///
/// Only unauthenticated endpoints are used, so no credentials are needed.
///
/// # Example
///
/// ```no_run
/// use wayfinder_interface::FeedSource;
/// use wayfinder_social::BlueskyClient;
///
/// # async fn run() -> wayfinder_error::WayfinderResult<()> {
/// let client = BlueskyClient::default();
/// let did = client.resolve_author("destinythegame.bungie.net").await?;
/// let posts = client.recent_posts(&did).await?;
/// println!("{} recent posts", posts.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BlueskyClient {
    http: reqwest::Client,
    api_root: String,
    timeout: Duration,
}

impl Default for BlueskyClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_ROOT)
    }
}

impl BlueskyClient {
    /// Create a client against `api_root`.
    pub fn new(api_root: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), api_root)
    }

    /// Create a client sharing an existing HTTP client.
    pub fn with_http_client(http: reqwest::Client, api_root: impl Into<String>) -> Self {
        Self {
            http,
            api_root: api_root.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Give up on any request that has not completed within `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// API root requests are sent to.
    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    async fn xrpc<T: DeserializeOwned>(&self, method: &str, actor: &str) -> Result<T, FeedError> {
        let url = format!("{}/xrpc/{}", self.api_root, method);
        let response = self
            .http
            .get(&url)
            .query(&[("actor", actor)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                error!(method, error = %e, "Bluesky request failed");
                FeedError::new(FeedErrorKind::Http(e.to_string()))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FeedError::new(FeedErrorKind::Http(e.to_string())))?;

        if !status.is_success() {
            error!(method, status = status.as_u16(), "Bluesky returned an error");
            return Err(FeedError::new(FeedErrorKind::Api {
                status: status.as_u16(),
                body,
            }));
        }

        serde_json::from_str(&body).map_err(|e| {
            FeedError::new(FeedErrorKind::Parse(format!("{method}: {e}")))
        })
    }
}

#[async_trait]
impl FeedSource for BlueskyClient {
    fn source_name(&self) -> &str {
        "bluesky"
    }

    #[instrument(skip(self))]
    async fn resolve_author(&self, handle: &str) -> WayfinderResult<String> {
        let profile: Profile = self.xrpc("app.bsky.actor.getProfile", handle).await?;
        debug!(did = %profile.did, "Resolved author");
        Ok(profile.did)
    }

    #[instrument(skip(self))]
    async fn recent_posts(&self, author_id: &str) -> WayfinderResult<Vec<FeedPost>> {
        let feed: AuthorFeed = self.xrpc("app.bsky.feed.getAuthorFeed", author_id).await?;
        debug!(count = feed.feed.len(), "Fetched author feed");
        Ok(feed.feed.into_iter().map(|entry| entry.post.into()).collect())
    }
}
