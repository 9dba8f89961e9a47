//! Tests for feed and post helpers.

use chrono::{TimeZone, Utc};
use wayfinder_core::{Feed, FeedPost};

fn post(uri: &str) -> FeedPost {
    FeedPost {
        uri: uri.to_string(),
        author_handle: "destinythegame.bungie.net".to_string(),
        text: String::new(),
        created_at: Utc.with_ymd_and_hms(2025, 4, 20, 12, 0, 0).unwrap(),
    }
}

#[test]
fn test_post_url_uses_last_uri_segment() {
    let p = post("at://did:plc:xyz/app.bsky.feed.post/3lnape7mfxs27");
    assert_eq!(p.post_id(), "3lnape7mfxs27");
    assert_eq!(
        p.url(),
        "https://bsky.app/profile/destinythegame.bungie.net/post/3lnape7mfxs27"
    );
}

#[test]
fn test_post_url_without_slashes() {
    let p = post("3lnape7mfxs27");
    assert_eq!(p.post_id(), "3lnape7mfxs27");
}

#[test]
fn test_feed_resolved_author() {
    let mut feed = Feed {
        id: 1,
        source: "bluesky".to_string(),
        author: "destinythegame.bungie.net".to_string(),
        author_source_id: None,
        last_message: None,
    };
    assert!(feed.resolved_author().is_none());
    assert_eq!(
        feed.profile_url(),
        "https://bsky.app/profile/destinythegame.bungie.net"
    );

    feed.author_source_id = Some("  ".to_string());
    assert!(feed.resolved_author().is_none());

    feed.author_source_id = Some("did:plc:abc".to_string());
    assert_eq!(feed.resolved_author(), Some("did:plc:abc"));
    assert_eq!(feed.profile_url(), "https://bsky.app/profile/did:plc:abc");
}
