//! Tracked external feeds and the posts fetched from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A followed external account mirrored into a chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    /// Internal row id
    pub id: i64,
    /// Feed provider name, e.g. `bluesky`
    pub source: String,
    /// Author handle as entered by an administrator
    pub author: String,
    /// Stable provider id for the author, resolved by validation
    pub author_source_id: Option<String>,
    /// Creation time of the newest post already republished
    pub last_message: Option<DateTime<Utc>>,
}

impl Feed {
    /// Author id to query the provider with, if the feed has been validated.
    pub fn resolved_author(&self) -> Option<&str> {
        self.author_source_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
    }

    /// Public profile page for the author.
    pub fn profile_url(&self) -> String {
        let actor = self.resolved_author().unwrap_or(&self.author);
        format!("https://bsky.app/profile/{actor}")
    }
}

/// A feed to be created by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFeed {
    /// Feed provider name
    pub source: String,
    /// Author handle
    pub author: String,
    /// Stable provider id, filled in by validation
    pub author_source_id: Option<String>,
    /// Initial watermark; `None` republishes everything outside the grace window
    pub last_message: Option<DateTime<Utc>>,
}

/// One post fetched from a feed provider.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use wayfinder_core::FeedPost;
///
/// let post = FeedPost {
///     uri: "at://did:plc:abc/app.bsky.feed.post/3lnape7mfxs27".into(),
///     author_handle: "destinythegame.bungie.net".into(),
///     text: "Maintenance tomorrow".into(),
///     created_at: Utc::now(),
/// };
/// assert_eq!(
///     post.url(),
///     "https://bsky.app/profile/destinythegame.bungie.net/post/3lnape7mfxs27"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    /// Provider URI of the post record
    pub uri: String,
    /// Handle of the posting account
    pub author_handle: String,
    /// Post body
    pub text: String,
    /// Creation time declared by the post record
    pub created_at: DateTime<Utc>,
}

impl FeedPost {
    /// Record key, the final path segment of the URI.
    pub fn post_id(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or(&self.uri)
    }

    /// Canonical public URL, which chat platforms expand into a rich embed.
    pub fn url(&self) -> String {
        format!(
            "https://bsky.app/profile/{}/post/{}",
            self.author_handle,
            self.post_id()
        )
    }
}
