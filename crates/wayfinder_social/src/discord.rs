//! Discord message publishing over Serenity's REST client.

use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use wayfinder_error::{FeedError, FeedErrorKind, WayfinderResult};
use wayfinder_interface::MessagePublisher;

/// Posts messages to Discord channels.
///
/// No gateway connection is opened; each publish is a single REST call.
pub struct DiscordPublisher {
    http: Arc<Http>,
}

impl DiscordPublisher {
    /// Create a publisher with a bot token.
    #[instrument(skip(token), fields(token_len = token.as_ref().len()))]
    pub fn new(token: impl AsRef<str>) -> Self {
        info!("Creating Discord publisher");
        Self {
            http: Arc::new(Http::new(token.as_ref())),
        }
    }

    /// Create a publisher sharing an existing HTTP client, and with it the
    /// client's rate-limit buckets.
    pub fn with_http_client(http: Arc<Http>) -> Self {
        Self { http }
    }

    /// Create a publisher from `DISCORD_TOKEN`.
    pub fn from_env() -> Result<Self, FeedError> {
        let token = std::env::var("DISCORD_TOKEN").map_err(|_| {
            FeedError::new(FeedErrorKind::Publisher(
                "DISCORD_TOKEN environment variable not set".to_string(),
            ))
        })?;
        Ok(Self::new(token))
    }

    /// Underlying HTTP client.
    pub fn http_client(&self) -> Arc<Http> {
        Arc::clone(&self.http)
    }
}

impl std::fmt::Debug for DiscordPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordPublisher").finish_non_exhaustive()
    }
}

#[async_trait]
impl MessagePublisher for DiscordPublisher {
    #[instrument(skip(self, content), fields(len = content.len()))]
    async fn publish(&self, channel_id: u64, content: &str) -> WayfinderResult<()> {
        if channel_id == 0 {
            return Err(FeedError::new(FeedErrorKind::Publish {
                channel: channel_id,
                message: "channel id must be non-zero".to_string(),
            })
            .into());
        }

        let message = ChannelId::new(channel_id)
            .say(self.http.as_ref(), content)
            .await
            .map_err(|e| {
                error!(channel_id, error = %e, "Failed to publish message");
                FeedError::new(FeedErrorKind::Publish {
                    channel: channel_id,
                    message: e.to_string(),
                })
            })?;

        debug!(message_id = %message.id, "Published message");
        Ok(())
    }
}
