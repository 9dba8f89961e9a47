//! Bluesky client against a local fake of the AppView.

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wayfinder_error::{FeedErrorKind, WayfinderErrorKind};
use wayfinder_interface::FeedSource;
use wayfinder_social::BlueskyClient;

#[derive(Clone, Default)]
struct FakeBluesky {
    actors: Arc<Mutex<Vec<String>>>,
}

async fn get_profile(
    State(fake): State<FakeBluesky>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    let actor = params.get("actor").cloned().unwrap_or_default();
    fake.actors.lock().unwrap().push(actor.clone());
    if actor == "destinythegame.bungie.net" {
        (
            StatusCode::OK,
            r#"{"did":"did:plc:destiny","handle":"destinythegame.bungie.net","displayName":"Destiny 2"}"#
                .to_string(),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            r#"{"error":"InvalidRequest","message":"Profile not found"}"#.to_string(),
        )
    }
}

async fn get_author_feed(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
    if params.get("actor").map(String::as_str) == Some("did:plc:stalled") {
        tokio::time::sleep(Duration::from_secs(30)).await;
    }
    match params.get("actor").map(String::as_str) {
        Some("did:plc:destiny") => (
            StatusCode::OK,
            r#"{"feed":[
                {"post":{"uri":"at://did:plc:destiny/app.bsky.feed.post/newest","author":{"did":"did:plc:destiny","handle":"destinythegame.bungie.net"},"record":{"text":"Iron Banner is live","createdAt":"2024-06-01T12:00:00.000Z"}}},
                {"post":{"uri":"at://did:plc:destiny/app.bsky.feed.post/older","author":{"did":"did:plc:destiny","handle":"destinythegame.bungie.net"},"record":{"text":"Reset","createdAt":"2024-05-28T17:00:00.000Z"}}}
            ]}"#
                .to_string(),
        ),
        Some("did:plc:garbled") => (StatusCode::OK, r#"{"feed":[{"post":{}}]}"#.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "upstream down".to_string()),
    }
}

async fn start(fake: FakeBluesky) -> String {
    let app = Router::new()
        .route("/xrpc/app.bsky.actor.getProfile", get(get_profile))
        .route("/xrpc/app.bsky.feed.getAuthorFeed", get(get_author_feed))
        .with_state(fake);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn feed_kind(err: &wayfinder_error::WayfinderError) -> FeedErrorKind {
    match err.kind() {
        WayfinderErrorKind::Feed(e) => e.kind.clone(),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_resolve_author() {
    let fake = FakeBluesky::default();
    let client = BlueskyClient::new(start(fake.clone()).await);

    let did = client
        .resolve_author("destinythegame.bungie.net")
        .await
        .unwrap();
    assert_eq!(did, "did:plc:destiny");
    assert_eq!(
        fake.actors.lock().unwrap().as_slice(),
        ["destinythegame.bungie.net"]
    );
}

#[tokio::test]
async fn test_unknown_author_is_api_error() {
    let client = BlueskyClient::new(start(FakeBluesky::default()).await);

    let err = client.resolve_author("nobody.example").await.unwrap_err();
    match feed_kind(&err) {
        FeedErrorKind::Api { status, body } => {
            assert_eq!(status, 400);
            assert!(body.contains("Profile not found"));
        }
        other => panic!("unexpected kind: {other}"),
    }
}

#[tokio::test]
async fn test_recent_posts_newest_first() {
    let client = BlueskyClient::new(start(FakeBluesky::default()).await);

    let posts = client.recent_posts("did:plc:destiny").await.unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].post_id(), "newest");
    assert_eq!(
        posts[0].url(),
        "https://bsky.app/profile/destinythegame.bungie.net/post/newest"
    );
    assert!(posts[0].created_at > posts[1].created_at);
}

#[tokio::test]
async fn test_malformed_feed_is_parse_error() {
    let client = BlueskyClient::new(start(FakeBluesky::default()).await);

    let err = client.recent_posts("did:plc:garbled").await.unwrap_err();
    assert!(matches!(feed_kind(&err), FeedErrorKind::Parse(_)));
}

#[tokio::test]
async fn test_unreachable_provider_is_http_error() {
    let client = BlueskyClient::new("http://127.0.0.1:1");

    let err = client.recent_posts("did:plc:destiny").await.unwrap_err();
    assert!(matches!(feed_kind(&err), FeedErrorKind::Http(_)));
}

#[tokio::test]
#[cfg_attr(not(feature = "api"), ignore)]
async fn test_live_destiny_feed() {
    let client = BlueskyClient::default();
    let did = client
        .resolve_author("destinythegame.bungie.net")
        .await
        .unwrap();
    assert!(did.starts_with("did:"));
    assert!(!client.recent_posts(&did).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stalled_provider_times_out() {
    let client = BlueskyClient::new(start(FakeBluesky::default()).await)
        .with_timeout(Duration::from_millis(200));

    let err = tokio::time::timeout(Duration::from_secs(5), client.recent_posts("did:plc:stalled"))
        .await
        .expect("request should give up on its own")
        .unwrap_err();
    assert!(matches!(feed_kind(&err), FeedErrorKind::Http(_)));
}
